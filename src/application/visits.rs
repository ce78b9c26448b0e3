//! Site-visit counting: bucketed totals with per-visitor daily deduplication.

use std::sync::{Arc, Mutex};

use metrics::counter;
use time::Date;
use tracing::{debug, info};

use crate::application::clock::Clock;
use crate::application::store::{CounterOp, CounterStore, StoreKind, absorb};
use crate::domain::keys::{
    BucketInstant, Bucketing, DAY_BUCKET_TTL_SECS, HOUR_BUCKET_TTL_SECS, UNIQUE_SET_TTL_SECS,
    VISITS_TOTAL_KEY,
};
use crate::domain::traffic::Exclusion;
use crate::domain::visitor::VisitorId;
use crate::util::lock::mutex_lock;

const SOURCE: &str = "application::visits::VisitService";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitCounts {
    pub total: u64,
    pub today: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitOutcome {
    pub counts: VisitCounts,
    /// `false` when the visitor was already counted today.
    pub counted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketValue {
    pub key: String,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitStats {
    pub days: Vec<BucketValue>,
    pub hours: Vec<BucketValue>,
}

#[derive(Debug, Clone, Copy)]
pub struct VisitPolicy {
    pub bucketing: Bucketing,
    /// Count each visitor at most once per day.
    pub dedup: bool,
}

impl Default for VisitPolicy {
    fn default() -> Self {
        Self {
            bucketing: Bucketing::default(),
            dedup: true,
        }
    }
}

pub struct VisitService {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    policy: VisitPolicy,
    last_day: Mutex<Option<Date>>,
}

impl VisitService {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>, policy: VisitPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            last_day: Mutex::new(None),
        }
    }

    /// Current totals without counting anything.
    pub async fn counts(&self) -> VisitCounts {
        let instant = self.current_instant().await;
        self.read_counts(&instant).await
    }

    /// Count a visit from `visitor`, unless it was already counted today.
    pub async fn record(&self, visitor: &VisitorId) -> VisitOutcome {
        let instant = self.current_instant().await;

        let mut ops = Vec::with_capacity(6);
        if self.policy.dedup {
            let unique_key = instant.unique_key();
            let newly_added = absorb(
                "add_to_set",
                self.store.add_to_set(&unique_key, visitor.as_str()).await,
            );
            if !newly_added {
                counter!("blog_counters_visits_duplicate_total").increment(1);
                debug!(
                    target = "blog_counters::visits",
                    visitor = %visitor,
                    day = %instant.day_label(),
                    "visitor already counted today"
                );
                return VisitOutcome {
                    counts: self.read_counts(&instant).await,
                    counted: false,
                };
            }
            ops.push(CounterOp::expire(unique_key, UNIQUE_SET_TTL_SECS));
        }

        let day_key = instant.day_key();
        let hour_key = instant.hour_key();
        ops.extend([
            CounterOp::increment(day_key.clone()),
            CounterOp::expire(day_key, DAY_BUCKET_TTL_SECS),
            CounterOp::increment(VISITS_TOTAL_KEY),
            CounterOp::increment(hour_key.clone()),
            CounterOp::expire(hour_key, HOUR_BUCKET_TTL_SECS),
        ]);
        absorb("apply", self.store.apply(&ops).await);

        counter!("blog_counters_visits_counted_total").increment(1);
        debug!(
            target = "blog_counters::visits",
            visitor = %visitor,
            day = %instant.day_label(),
            hour = instant.hour,
            "visit counted"
        );

        VisitOutcome {
            counts: self.read_counts(&instant).await,
            counted: true,
        }
    }

    /// Totals for a hit that was classified as a bot or prefetch.
    pub async fn ignore(&self, exclusion: Exclusion) -> VisitCounts {
        counter!("blog_counters_visits_ignored_total", "reason" => exclusion.as_str()).increment(1);
        debug!(
            target = "blog_counters::visits",
            reason = %exclusion,
            "visit ignored"
        );
        self.counts().await
    }

    /// Last 7 days and last 24 hours of visit buckets, oldest first.
    ///
    /// The in-memory store keeps no history worth reporting, so it yields
    /// empty series.
    pub async fn stats(&self) -> VisitStats {
        if self.store.kind() == StoreKind::Memory {
            return VisitStats::default();
        }

        let now = self.clock.now();
        let day_keys = self.policy.bucketing.day_window(now);
        let hour_keys = self.policy.bucketing.hour_window(now);

        let days = self.read_series("read_many.days", day_keys).await;
        let hours = self.read_series("read_many.hours", hour_keys).await;
        VisitStats { days, hours }
    }

    async fn read_series(&self, operation: &'static str, keys: Vec<String>) -> Vec<BucketValue> {
        let values = absorb(operation, self.store.read_many(&keys).await);
        keys.into_iter()
            .enumerate()
            .map(|(index, key)| BucketValue {
                value: values.get(index).copied().unwrap_or(0),
                key,
            })
            .collect()
    }

    async fn read_counts(&self, instant: &BucketInstant) -> VisitCounts {
        let keys = [VISITS_TOTAL_KEY.to_string(), instant.day_key()];
        let values = absorb("read_many.counts", self.store.read_many(&keys).await);
        VisitCounts {
            total: values.first().copied().unwrap_or(0),
            today: values.get(1).copied().unwrap_or(0),
        }
    }

    /// Bucket for "now", resetting expiring buckets first when the day changed.
    async fn current_instant(&self) -> BucketInstant {
        let instant = self.policy.bucketing.instant(self.clock.now());
        if self.observe_day(instant.date) {
            info!(
                target = "blog_counters::visits",
                day = %instant.day_label(),
                store = self.store.kind().as_str(),
                "day rolled over; resetting bucketed counters"
            );
            absorb("reset_buckets", self.store.reset_buckets().await);
        }
        instant
    }

    /// Record `today` and report whether it differs from the previously seen day.
    fn observe_day(&self, today: Date) -> bool {
        let mut last_day = mutex_lock(&self.last_day, SOURCE, "observe_day");
        match last_day.replace(today) {
            Some(previous) => previous != today,
            None => false,
        }
    }
}
