//! Prometheus metrics for the dAPI server.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a fatal configuration error at start-up.
//! These panics only occur during static initialization.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, CounterVec, Encoder, IntCounter, TextEncoder,
};

/// Committed data feed writes.
/// Labels: kind (beacon/beacon_set/psp_beacon/psp_beacon_set/oev)
pub static FEED_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dapi_feed_updates_total",
        "Total committed data feed writes",
        &["kind"]
    )
    .unwrap()
});

/// Rejected updates by reason.
/// Labels: kind, reason (error label such as timestamp_not_newer)
pub static UPDATE_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dapi_update_rejected_total",
        "Total rejected update calls",
        &["kind", "reason"]
    )
    .unwrap()
});

/// PSP condition evaluations.
/// Labels: target (beacon/beacon_set), due (true/false)
pub static CONDITION_CHECKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dapi_condition_checks_total",
        "Total PSP update condition evaluations",
        &["target", "due"]
    )
    .unwrap()
});

/// Credited OEV bids.
pub static OEV_BIDS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("dapi_oev_bids_total", "Total OEV bids credited to escrow").unwrap()
});

/// OEV escrow withdrawals.
/// Labels: outcome (paid/rejected)
pub static OEV_WITHDRAWALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dapi_oev_withdrawals_total",
        "Total OEV escrow withdrawal attempts",
        &["outcome"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a committed write.
    pub fn feed_updated(kind: &str) {
        FEED_UPDATES_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a rejected update.
    pub fn update_rejected(kind: &str, reason: &str) {
        UPDATE_REJECTED_TOTAL
            .with_label_values(&[kind, reason])
            .inc();
    }

    /// Record a PSP condition evaluation.
    pub fn condition_checked(target: &str, due: bool) {
        let due = if due { "true" } else { "false" };
        CONDITION_CHECKS_TOTAL
            .with_label_values(&[target, due])
            .inc();
    }

    pub fn oev_bid_credited() {
        OEV_BIDS_TOTAL.inc();
    }

    /// Record a withdrawal attempt.
    pub fn oev_withdrawal(paid: bool) {
        let outcome = if paid { "paid" } else { "rejected" };
        OEV_WITHDRAWALS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
