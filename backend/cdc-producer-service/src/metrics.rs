//! Prometheus metrics for the CDC load producer
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    IntCounterVec, IntGauge, IntGaugeVec, Registry, TextEncoder,
};

lazy_static! {
    /// Global registry for all producer metrics
    pub static ref REGISTRY: Registry = Registry::new();

    // ======================
    // Counters
    // ======================

    /// Events handed to the transport (labels: system, table)
    pub static ref CDC_EVENTS_SENT: IntCounterVec = register_int_counter_vec_with_registry!(
        "cdc_events_sent_total",
        "Number of CDC events handed to the transport",
        &["system", "table"],
        REGISTRY
    )
    .unwrap();

    /// Abandoned emission cycles (labels: kind = publish|synthesis|serialization)
    pub static ref CDC_EVENTS_ERRORS: IntCounterVec = register_int_counter_vec_with_registry!(
        "cdc_events_errors_total",
        "Number of emission cycles abandoned because of an error",
        &["kind"],
        REGISTRY
    )
    .unwrap();

    /// Delivery reports that came back failed (labels: topic)
    pub static ref CDC_DELIVERY_FAILURES: IntCounterVec = register_int_counter_vec_with_registry!(
        "cdc_delivery_failures_total",
        "Number of enqueued events whose delivery failed",
        &["topic"],
        REGISTRY
    )
    .unwrap();

    // ======================
    // Histograms
    // ======================

    /// Time spent in one synthesize-serialize-publish cycle
    pub static ref CDC_EVENT_SEND_DURATION_SECONDS: Histogram = register_histogram_with_registry!(
        "cdc_event_send_duration_seconds",
        "Latency of one synthesize, serialize and publish cycle",
        vec![0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1],
        REGISTRY
    )
    .unwrap();

    // ======================
    // Gauges
    // ======================

    /// Last allocated id per table (labels: entity)
    pub static ref CDC_ID_SEQUENCE: IntGaugeVec = register_int_gauge_vec_with_registry!(
        "cdc_id_sequence",
        "Last id allocated per simulated table",
        &["entity"],
        REGISTRY
    )
    .unwrap();

    /// Emission workers currently running
    pub static ref CDC_WORKERS_RUNNING: IntGauge = register_int_gauge_with_registry!(
        "cdc_producer_workers_running",
        "Number of emission workers currently running",
        REGISTRY
    )
    .unwrap();
}

/// Render the registry in Prometheus text format
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Helper functions for recording producer metrics
pub mod helpers {
    use super::*;
    use crate::context::SequenceSnapshot;
    use std::time::Duration;

    pub fn record_event_sent(system: &str, table: &str, elapsed: Duration) {
        CDC_EVENTS_SENT.with_label_values(&[system, table]).inc();
        CDC_EVENT_SEND_DURATION_SECONDS.observe(elapsed.as_secs_f64());
    }

    pub fn record_event_error(kind: &str) {
        CDC_EVENTS_ERRORS.with_label_values(&[kind]).inc();
    }

    pub fn record_delivery_failure(topic: &str) {
        CDC_DELIVERY_FAILURES.with_label_values(&[topic]).inc();
    }

    pub fn update_sequences(snapshot: &SequenceSnapshot) {
        for (entity, value) in [
            ("customer", snapshot.customers),
            ("order", snapshot.orders),
            ("product", snapshot.products),
            ("inventory", snapshot.inventory),
        ] {
            CDC_ID_SEQUENCE
                .with_label_values(&[entity])
                .set(value.min(i64::MAX as u64) as i64);
        }
    }

    pub fn worker_started() {
        CDC_WORKERS_RUNNING.inc();
    }

    pub fn worker_stopped() {
        CDC_WORKERS_RUNNING.dec();
    }
}
