//! Metrics collection and Prometheus export.
//!
//! Installs the Prometheus recorder and records AI provider usage.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> anyhow::Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Record one call to an AI provider.
pub fn record_ai_request(operation: &'static str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!("ai_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("ai_request_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

/// Record token usage reported by the provider.
pub fn record_tokens(operation: &'static str, input_tokens: i32, output_tokens: i32) {
    metrics::counter!("ai_tokens_total", "operation" => operation, "type" => "input")
        .increment(input_tokens.max(0) as u64);
    metrics::counter!("ai_tokens_total", "operation" => operation, "type" => "output")
        .increment(output_tokens.max(0) as u64);
}
