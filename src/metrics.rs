//! Prometheus metrics for StartupMatch.
//!
//! Exposes a standard `/metrics` endpoint that Prometheus can scrape. All
//! metrics live in the global default registry and are registered lazily on
//! first use, so tests that build many routers never double-register.

use once_cell::sync::Lazy;
use prometheus::{
    opts, register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge,
    TextEncoder,
};

use crate::models::content::{ContentKind, ModerationStatus};

/// Currently open relay connections.
pub static RELAY_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(opts!(
        "startupmatch_relay_connections",
        "Open WebSocket relay connections"
    ))
    .expect("failed to register startupmatch_relay_connections")
});

/// Inbound relay frames by event type and outcome (`broadcast`, `dropped`, or `lagged` for a full connection queue).
pub static RELAY_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "startupmatch_relay_events_total",
            "Inbound relay frames by event type and outcome"
        ),
        &["type", "outcome"]
    )
    .expect("failed to register startupmatch_relay_events_total")
});

/// Applied moderation transitions by content kind and target status.
pub static MODERATION_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "startupmatch_moderation_transitions_total",
            "Moderation status writes by content kind and target status"
        ),
        &["kind", "status"]
    )
    .expect("failed to register startupmatch_moderation_transitions_total")
});

pub fn record_relay_event(event_type: &str, outcome: &str) {
    RELAY_EVENTS_TOTAL
        .with_label_values(&[event_type, outcome])
        .inc();
}

pub fn record_transition(kind: ContentKind, status: ModerationStatus) {
    MODERATION_TRANSITIONS_TOTAL
        .with_label_values(&[kind.as_str(), status.as_str()])
        .inc();
}

/// Encode all registered metrics as Prometheus text format.
/// Called by the `/metrics` HTTP handler.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────
