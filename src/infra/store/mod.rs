//! Counter store backends.

mod memory;
mod upstash;

use std::sync::Arc;

use tracing::info;

pub use memory::MemoryCounterStore;
pub use upstash::UpstashCounterStore;

use crate::application::store::CounterStore;
use crate::config::StoreSettings;
use crate::infra::error::InfraError;

/// Pick the backend once at startup: remote when credentials are configured,
/// otherwise a fresh in-memory store.
pub fn build_counter_store(settings: &StoreSettings) -> Result<Arc<dyn CounterStore>, InfraError> {
    let store: Arc<dyn CounterStore> = match settings.remote.as_ref() {
        Some(remote) => {
            info!(
                target = "blog_counters::store",
                url = %remote.url,
                timeout_seconds = remote.timeout.map(|timeout| timeout.as_secs()),
                "using upstash counter store"
            );
            Arc::new(UpstashCounterStore::new(remote)?)
        }
        None => {
            info!(
                target = "blog_counters::store",
                "no store credentials configured; counting in memory"
            );
            Arc::new(MemoryCounterStore::new())
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::StoreKind;
    use crate::config::RemoteStoreSettings;

    #[test]
    fn missing_credentials_fall_back_to_memory() {
        let store = build_counter_store(&StoreSettings::default()).unwrap();
        assert_eq!(store.kind(), StoreKind::Memory);
    }

    #[test]
    fn credentials_select_remote_store() {
        let settings = StoreSettings {
            remote: Some(RemoteStoreSettings {
                url: "https://eu1-example.upstash.io".parse().unwrap(),
                token: "secret".into(),
                timeout: None,
            }),
        };
        let store = build_counter_store(&settings).unwrap();
        assert_eq!(store.kind(), StoreKind::Remote);
    }
}
