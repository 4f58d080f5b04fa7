// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, Unit};

// NOTE: when the observability feature is disabled, provide stub implementations
// so call sites never have to cfg-guard themselves.
#[cfg(not(feature = "observability"))]
pub enum Unit {}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! gauge {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_gauge {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_gauge, gauge};

/// Initializes the descriptions for every metric this crate emits. Call once
/// at startup, after the recorder (see [`install_recorder`]) is installed.
pub fn describe_metrics() {
    describe_gauge!(
        "faas_sim_active_instances",
        "Current number of active (running or idle) instances in the engine being driven."
    );
    describe_gauge!(
        "faas_sim_idle_instances",
        "Current number of idle instances."
    );
    describe_counter!(
        "faas_sim_requests_total",
        Unit::Count,
        "Total requests handled, labeled by outcome (cold, warm, reject)."
    );
    describe_counter!(
        "faas_sim_runs_total",
        Unit::Count,
        "Total number of simulation runs completed."
    );
    describe_histogram!(
        "faas_sim_run_duration_seconds",
        Unit::Seconds,
        "Wall-clock time taken to execute one simulation run."
    );
}

pub fn set_active_instances(count: usize) {
    gauge!("faas_sim_active_instances", count as f64);
}

pub fn set_idle_instances(count: usize) {
    gauge!("faas_sim_idle_instances", count as f64);
}

pub fn increment_requests(outcome: &str) {
    counter!("faas_sim_requests_total", 1, "outcome" => outcome.to_string());
}

pub fn increment_runs() {
    counter!("faas_sim_runs_total", 1);
}

pub fn record_run_duration_seconds(seconds: f64) {
    #[cfg(feature = "observability")]
    metrics::histogram!("faas_sim_run_duration_seconds", seconds);
    #[cfg(not(feature = "observability"))]
    let _ = seconds;
}

/// Installs the global Prometheus recorder with its own scrape listener at
/// `addr`, separate from the simulation's own HTTP surface. Must be called
/// from within a `tokio` runtime.
#[cfg(feature = "observability")]
pub fn install_recorder(addr: std::net::SocketAddr) -> crate::error::SimResult<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| crate::error::SimError::InvalidConfiguration(e.to_string()))?;
    describe_metrics();
    Ok(())
}
