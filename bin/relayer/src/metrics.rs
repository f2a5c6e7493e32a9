//! Prometheus metrics for the relayer.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use client::types::OutgoingMessageState;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Aggregated metrics for the relayer.
///
/// Metrics are registered with the global metrics registry on creation.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Cycle metrics
        describe_counter!("relayer_cycles_total", "Total number of relayer cycles executed");
        describe_counter!(
            "relayer_cycles_success_total",
            "Total number of successful relayer cycles"
        );
        describe_counter!(
            "relayer_cycles_failure_total",
            "Total number of failed relayer cycles"
        );
        describe_histogram!(
            "relayer_cycle_duration_seconds",
            "Duration of each relayer cycle in seconds"
        );

        // Ledger metrics
        describe_counter!(
            "relayer_rebuilds_total",
            "Total number of pending ledger rebuilds"
        );
        describe_counter!(
            "relayer_skipped_withdrawals_total",
            "Withdrawals that could not be read during a rebuild"
        );
        describe_gauge!(
            "relayer_pending_withdrawals",
            "Number of pending withdrawals by outbound message state"
        );

        // Execution metrics
        describe_counter!(
            "relayer_executions_total",
            "Outbox executions by outcome (success, reverted, error)"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Cycle metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a completed cycle.
    pub fn record_cycle(&self, success: bool, duration: Duration) {
        counter!("relayer_cycles_total").increment(1);
        histogram!("relayer_cycle_duration_seconds").record(duration.as_secs_f64());

        if success {
            counter!("relayer_cycles_success_total").increment(1);
        } else {
            counter!("relayer_cycles_failure_total").increment(1);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Ledger metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_rebuild(&self, skipped: usize) {
        counter!("relayer_rebuilds_total").increment(1);
        counter!("relayer_skipped_withdrawals_total").increment(skipped as u64);
    }

    /// Set the count of pending withdrawals in `state`.
    pub fn set_pending_withdrawals(&self, state: OutgoingMessageState, count: usize) {
        gauge!("relayer_pending_withdrawals", "state" => state.as_str()).set(count as f64);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Execution metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_execution(&self, outcome: ExecutionOutcome) {
        counter!("relayer_executions_total", "outcome" => outcome.as_str()).increment(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Reverted,
    Error,
}

impl ExecutionOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Reverted => "reverted",
            Self::Error => "error",
        }
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
