//! Metrics collection.
//!
//! # Metrics
//! - `config_store_writes_total` (counter): writes by baseline state
//! - `config_store_notifications_total` (counter): derived notifications by kind
//! - `config_store_recoveries_total` (counter): fallbacks to defaults by reason
//! - `config_store_listener_failures_total` (counter): failed callbacks by event
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder the calls are no-ops.

pub fn record_write(baseline: &'static str) {
    metrics::counter!("config_store_writes_total", "baseline" => baseline).increment(1);
}

pub fn record_notification(kind: &'static str) {
    metrics::counter!("config_store_notifications_total", "kind" => kind).increment(1);
}

pub fn record_recovery(reason: &'static str) {
    metrics::counter!("config_store_recoveries_total", "reason" => reason).increment(1);
}

pub fn record_listener_failure(event: &'static str) {
    metrics::counter!("config_store_listener_failures_total", "event" => event).increment(1);
}
