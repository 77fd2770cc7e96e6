use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("pet_health_statds")
        .with_description("Pet health scheduler statistics")
        .with_unit("notification")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

/// Outcome of a scheduler step: `run`, `sent`, `duplicate`, `error`.
pub fn incr_scheduler_statds(outcome: &str) {
    incr_statds("scheduler".to_string(), outcome.into())
}
