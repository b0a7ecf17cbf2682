use async_trait::async_trait;

use super::Notifier;

/// Notifier used when no backend is configured. Nothing is ever delivered.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _text: &str) -> bool {
        false
    }
}
