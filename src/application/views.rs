use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use crate::application::store::{CounterStore, absorb, report_failure};
use crate::domain::keys::post_views_key;

/// Per-post view counter.
///
/// Unlike visits there is no bot filter and no deduplication: every recorded
/// view increments, so a reader refreshing a post inflates its count.
#[derive(Clone)]
pub struct PostViewService {
    store: Arc<dyn CounterStore>,
}

impl PostViewService {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, slug: &str) -> u64 {
        let key = post_views_key(slug);
        counter!("blog_counters_post_views_total").increment(1);

        let views = match self.store.increment(&key).await {
            Ok(views) => views,
            Err(err) => {
                // The increment may still have landed; report what the store holds.
                report_failure("increment", &err);
                absorb("read", self.store.read(&key).await)
            }
        };

        debug!(target = "blog_counters::views", slug, views, "post view recorded");
        views
    }

    pub async fn current(&self, slug: &str) -> u64 {
        absorb("read", self.store.read(&post_views_key(slug)).await)
    }
}
