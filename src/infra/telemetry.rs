use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "blog_counters_post_views_total",
            Unit::Count,
            "Total number of recorded post views."
        );
        describe_counter!(
            "blog_counters_visits_counted_total",
            Unit::Count,
            "Total number of site visits that incremented the counters."
        );
        describe_counter!(
            "blog_counters_visits_duplicate_total",
            Unit::Count,
            "Total number of visits skipped because the visitor was already counted today."
        );
        describe_counter!(
            "blog_counters_visits_ignored_total",
            Unit::Count,
            "Total number of visits classified as bot or prefetch traffic."
        );
        describe_counter!(
            "blog_counters_store_errors_total",
            Unit::Count,
            "Total number of counter store failures absorbed as zero."
        );
    });
}
