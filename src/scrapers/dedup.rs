//! Novelty decisions for extracted candidates.
//!
//! Two tiers: a run-scoped [`SeenSet`] catches repeats within one run
//! (pagination overlap), the [`EventStore`] catches events persisted by
//! earlier runs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::models::{CandidateEvent, DedupKey};
use crate::repository::{EventStore, StoreError};

/// Keys claimed during one run of one source.
///
/// `claim` is an atomic check-and-insert, so two workers racing on the
/// same key cannot both win. The lock is never held across I/O.
#[derive(Default)]
pub struct SeenSet {
    keys: Mutex<HashSet<DedupKey>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the key; true if it was not already present.
    pub fn claim(&self, key: &DedupKey) -> bool {
        match self.keys.lock() {
            Ok(mut guard) => guard.insert(key.clone()),
            Err(poisoned) => poisoned.into_inner().insert(key.clone()),
        }
    }

    /// Give a claim back so a later candidate with the same key may try again.
    pub fn release(&self, key: &DedupKey) {
        match self.keys.lock() {
            Ok(mut guard) => guard.remove(key),
            Err(poisoned) => poisoned.into_inner().remove(key),
        };
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        match self.keys.lock() {
            Ok(guard) => guard.contains(key),
            Err(poisoned) => poisoned.into_inner().contains(key),
        }
    }

    pub fn len(&self) -> usize {
        match self.keys.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decides whether a candidate should be persisted.
pub struct DedupGate {
    collection: String,
    seen: SeenSet,
    store: Arc<dyn EventStore>,
}

impl DedupGate {
    /// Gate for one run of `collection`, starting with an empty SeenSet.
    pub fn new(collection: &str, store: Arc<dyn EventStore>) -> Self {
        Self {
            collection: collection.to_string(),
            seen: SeenSet::new(),
            store,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// True if the candidate is novel and should be written.
    ///
    /// The key is claimed before the store lookup. A key found in the store
    /// stays claimed so later repeats skip the lookup. If the lookup fails
    /// the claim is released and the error returned; the candidate is not
    /// written this run.
    pub async fn accept(&self, candidate: &CandidateEvent) -> Result<bool, StoreError> {
        let key = candidate.dedup_key();
        if !self.seen.claim(&key) {
            return Ok(false);
        }

        match self.store.exists_by_key(&self.collection, &key).await {
            Ok(exists) => Ok(!exists),
            Err(e) => {
                self.seen.release(&key);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryEventStore, StoreResult};
    use crate::models::Event;
    use async_trait::async_trait;

    fn jazz() -> CandidateEvent {
        CandidateEvent {
            title: "Jazz Night".to_string(),
            date: "Jun 1".to_string(),
            location: "NJ".to_string(),
            url: "https://www.eventbrite.com/e/1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_accept_twice() {
        let store = Arc::new(MemoryEventStore::new());
        let gate = DedupGate::new("princeton", store.clone());

        assert!(gate.accept(&jazz()).await.unwrap());
        assert!(!gate.accept(&jazz()).await.unwrap());
        // Second call short-circuits on the SeenSet
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_rejects_persisted_key() {
        let store = Arc::new(MemoryEventStore::new());
        store
            .seed("princeton", vec![jazz().into_event("princeton")])
            .await;
        let gate = DedupGate::new("princeton", store.clone());

        assert!(!gate.accept(&jazz()).await.unwrap());
        assert!(gate.seen().contains(&jazz().dedup_key()));
        assert!(!gate.accept(&jazz()).await.unwrap());
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_accept_single_winner() {
        let gate = Arc::new(DedupGate::new("newark", Arc::new(MemoryEventStore::new())));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.accept(&jazz()).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    struct BrokenStore;

    #[async_trait]
    impl EventStore for BrokenStore {
        async fn exists_by_key(&self, _: &str, _: &DedupKey) -> StoreResult<bool> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn insert_many(&self, _: &str, _: &[Event]) -> StoreResult<usize> {
            Ok(0)
        }
        async fn recent(&self, _: &str, _: usize) -> StoreResult<Vec<Event>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_lookup_releases_claim() {
        let gate = DedupGate::new("camden", Arc::new(BrokenStore));
        assert!(gate.accept(&jazz()).await.is_err());
        assert!(gate.seen().is_empty());
    }
}
