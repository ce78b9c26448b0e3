use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use blog_counters::application::{
    clock::ManualClock,
    store::{CounterStore, StoreError, StoreKind},
    views::PostViewService,
    visits::{VisitPolicy, VisitService},
};
use blog_counters::domain::visitor::VisitorId;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use time::macros::datetime;

struct DownStore;

#[async_trait]
impl CounterStore for DownStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Remote
    }

    async fn increment(&self, _key: &str) -> Result<u64, StoreError> {
        Err(StoreError::transport("connection refused"))
    }

    async fn read(&self, _key: &str) -> Result<u64, StoreError> {
        Err(StoreError::transport("connection refused"))
    }

    async fn read_many(&self, _keys: &[String]) -> Result<Vec<u64>, StoreError> {
        Err(StoreError::transport("connection refused"))
    }

    async fn set_expire(&self, _key: &str, _seconds: u64) -> Result<(), StoreError> {
        Err(StoreError::transport("connection refused"))
    }

    async fn add_to_set(&self, _key: &str, _member: &str) -> Result<bool, StoreError> {
        Err(StoreError::transport("connection refused"))
    }
}

#[tokio::test]
async fn absorbed_store_failures_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let store: Arc<dyn CounterStore> = Arc::new(DownStore);
    let views = PostViewService::new(store.clone());
    let visits = VisitService::new(
        store,
        Arc::new(ManualClock::new(datetime!(2026-10-19 09:30 UTC))),
        VisitPolicy::default(),
    );

    assert_eq!(views.record("hello").await, 0);
    let outcome = visits
        .record(&VisitorId::parse("reader-1").expect("valid id"))
        .await;
    assert!(!outcome.counted);
    assert_eq!(outcome.counts.total, 0);

    let stats = visits.stats().await;
    assert_eq!(stats.days.len(), 7);
    assert!(stats.days.iter().all(|bucket| bucket.value == 0));

    let mut errors_by_operation: HashMap<String, u64> = HashMap::new();
    let mut post_views = 0;
    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let DebugValue::Counter(count) = value else {
            continue;
        };
        let key = key.key();
        match key.name() {
            "blog_counters_store_errors_total" => {
                let operation = key
                    .labels()
                    .find(|label| label.key() == "operation")
                    .map(|label| label.value().to_string())
                    .unwrap_or_default();
                *errors_by_operation.entry(operation).or_default() += count;
            }
            "blog_counters_post_views_total" => post_views += count,
            _ => {}
        }
    }

    assert_eq!(post_views, 1);
    assert_eq!(errors_by_operation.get("increment"), Some(&1));
    assert_eq!(errors_by_operation.get("read"), Some(&1));
    assert_eq!(errors_by_operation.get("add_to_set"), Some(&1));
    assert_eq!(errors_by_operation.get("read_many.days"), Some(&1));
    assert_eq!(errors_by_operation.get("read_many.hours"), Some(&1));
}
