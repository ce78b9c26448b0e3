//! Process-local counter store used when no remote credentials are configured.
//!
//! Expirations are recorded but never timed out; bucketed keys disappear only
//! when [`CounterStore::reset_buckets`] is called on day rollover.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use crate::application::store::{CounterStore, StoreError, StoreKind};

#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, u64>,
    sets: DashMap<String, HashSet<String>>,
    bucketed: DashSet<String>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw counter value; `None` when the key was never written or was reset.
    pub fn counter_value(&self, key: &str) -> Option<u64> {
        self.counters.get(key).map(|entry| *entry.value())
    }

    pub fn has_set(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
        Ok(*entry)
    }

    async fn read(&self, key: &str) -> Result<u64, StoreError> {
        Ok(self.counter_value(key).unwrap_or(0))
    }

    async fn read_many(&self, keys: &[String]) -> Result<Vec<u64>, StoreError> {
        Ok(keys
            .iter()
            .map(|key| self.counter_value(key).unwrap_or(0))
            .collect())
    }

    async fn set_expire(&self, key: &str, _seconds: u64) -> Result<(), StoreError> {
        self.bucketed.insert(key.to_string());
        Ok(())
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        Ok(self
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn reset_buckets(&self) -> Result<(), StoreError> {
        let keys: Vec<String> = self.bucketed.iter().map(|key| key.key().clone()).collect();
        for key in &keys {
            self.counters.remove(key);
            self.sets.remove(key);
            self.bucketed.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::CounterOp;

    #[tokio::test]
    async fn increment_starts_from_zero() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.read("k").await.unwrap(), 0);
        assert_eq!(store.increment("k").await.unwrap(), 1);
        assert_eq!(store.increment("k").await.unwrap(), 2);
        assert_eq!(store.read("k").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn read_many_preserves_order_and_fills_zero() {
        let store = MemoryCounterStore::new();
        store.increment("b").await.unwrap();
        store.increment("b").await.unwrap();
        store.increment("c").await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(store.read_many(&keys).await.unwrap(), vec![0, 2, 1]);
        assert!(store.read_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_to_set_reports_first_insert_only() {
        let store = MemoryCounterStore::new();
        assert!(store.add_to_set("s", "alice").await.unwrap());
        assert!(!store.add_to_set("s", "alice").await.unwrap());
        assert!(store.add_to_set("s", "bob").await.unwrap());
        assert!(store.add_to_set("other", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn apply_runs_increments_and_marks_expiry() {
        let store = MemoryCounterStore::new();
        store
            .apply(&[
                CounterOp::increment("day"),
                CounterOp::expire("day", 60),
                CounterOp::increment("total"),
            ])
            .await
            .unwrap();

        assert_eq!(store.counter_value("day"), Some(1));
        assert_eq!(store.counter_value("total"), Some(1));
        assert!(store.bucketed.contains("day"));
        assert!(!store.bucketed.contains("total"));
    }

    #[tokio::test]
    async fn reset_buckets_only_drops_expiring_keys() {
        let store = MemoryCounterStore::new();
        store.increment("day").await.unwrap();
        store.set_expire("day", 60).await.unwrap();
        store.add_to_set("seen", "alice").await.unwrap();
        store.set_expire("seen", 60).await.unwrap();
        store.increment("total").await.unwrap();

        store.reset_buckets().await.unwrap();

        assert_eq!(store.counter_value("day"), None);
        assert!(!store.has_set("seen"));
        assert_eq!(store.counter_value("total"), Some(1));
        assert!(store.add_to_set("seen", "alice").await.unwrap());
    }
}
