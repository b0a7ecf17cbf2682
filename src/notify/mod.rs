//! Fire-and-forget run notifications.

mod noop;
mod slack;

pub use noop::NoopNotifier;
pub use slack::SlackNotifier;

use async_trait::async_trait;

/// Pluggable notification backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message. Returns false on any delivery failure; never errors.
    async fn notify(&self, text: &str) -> bool;
}

/// Message sent after a source produced new events.
pub fn scraped_message(count: usize, collection: &str) -> String {
    format!("Scraped {} new events for {}.", count, collection)
}

/// Message sent when a source's novel events could not be written.
pub fn persist_failed_message(count: usize, collection: &str, error: &str) -> String {
    format!("Failed to save {} events for {}: {}", count, collection, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            scraped_message(3, "princeton"),
            "Scraped 3 new events for princeton."
        );
        assert_eq!(
            persist_failed_message(2, "newark", "Store unavailable: down"),
            "Failed to save 2 events for newark: Store unavailable: down"
        );
    }
}
