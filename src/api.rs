//! The HTTP surface: a thin `axum` wrapper that validates a request,
//! dispatches it to the [`crate::worker`] pool, and serializes the result.
//! No simulation logic lives here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::SimError;
use crate::params::SimParams;
use crate::trace::{ResultDict, SkipInit, Trace};
use crate::worker::WorkerPoolHandle;

#[derive(Clone)]
pub struct AppState {
    pub worker_pool: WorkerPoolHandle,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/sim/single", post(run_single))
        .route("/sim/overall", post(run_sweep))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for(err: &SimError) -> StatusCode {
    match err {
        SimError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: SimError) -> (StatusCode, Json<ErrorBody>) {
    (
        status_for(&err),
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

async fn healthz() -> &'static str {
    "OK"
}

const MAX_SAMPLED_POINTS: usize = 20;

/// Picks up to `MAX_SAMPLED_POINTS` evenly-spaced rows from the trace and
/// returns `(times, instance_counts, running_cumulative_average)`, with the
/// running average at index 0 forced to `0.0`.
fn sample_history(trace: &Trace) -> (Vec<f64>, Vec<usize>, Vec<f64>) {
    let len = trace.hist_times.len();
    if len == 0 {
        return (Vec::new(), Vec::new(), Vec::new());
    }
    let step = ((len as f64) / MAX_SAMPLED_POINTS as f64).ceil().max(1.0) as usize;
    let indices: Vec<usize> = (0..len).step_by(step).collect();

    let times: Vec<f64> = indices.iter().map(|&i| trace.hist_times[i]).collect();
    let counts: Vec<usize> = indices.iter().map(|&i| trace.hist_server_count[i]).collect();

    let mut avgs = Vec::with_capacity(counts.len());
    let mut running_sum = 0.0;
    for (i, &count) in counts.iter().enumerate() {
        running_sum += count as f64;
        avgs.push(if i == 0 { 0.0 } else { running_sum / (i + 1) as f64 });
    }

    (times, counts, avgs)
}

#[derive(Debug, Serialize)]
struct SingleSimResponse {
    #[serde(flatten)]
    result: ResultDict,
    sampled_hist_times: Vec<f64>,
    sampled_hist_inst_counts: Vec<usize>,
    sampled_hist_inst_avgs: Vec<f64>,
}

async fn run_single(
    State(state): State<AppState>,
    Json(params): Json<SimParams>,
) -> Result<Json<SingleSimResponse>, (StatusCode, Json<ErrorBody>)> {
    params.validate().map_err(error_response)?;

    let trace = state
        .worker_pool
        .submit(params)
        .await
        .map_err(error_response)?;

    let (sampled_hist_times, sampled_hist_inst_counts, sampled_hist_inst_avgs) =
        sample_history(&trace);

    Ok(Json(SingleSimResponse {
        result: trace.result_dict(SkipInit::none()),
        sampled_hist_times,
        sampled_hist_inst_counts,
        sampled_hist_inst_avgs,
    }))
}

#[derive(Debug, Deserialize)]
struct SweepRequest {
    warm_service_rate: f64,
    cold_service_rate: f64,
    #[serde(default)]
    max_time: Option<f64>,
    #[serde(default)]
    maximum_concurrency: Option<usize>,
    #[serde(default)]
    concurrency_value: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct SweepPoint {
    arrival_rate: f64,
    expiration_threshold: f64,
    prob_cold_percent: f64,
    utilization_percent: Option<f64>,
}

const SWEEP_ARRIVAL_RATE_MIN: f64 = 1e-3;
const SWEEP_ARRIVAL_RATE_MAX: f64 = 1e1;
const SWEEP_ARRIVAL_RATE_POINTS: usize = 10;
const SWEEP_EXPIRATION_THRESHOLDS: [f64; 5] = [10.0, 60.0, 600.0, 1200.0, 1800.0];

fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let log_start = start.log10();
    let log_end = end.log10();
    (0..n)
        .map(|i| {
            let frac = i as f64 / (n - 1) as f64;
            10f64.powf(log_start + frac * (log_end - log_start))
        })
        .collect()
}

async fn run_sweep(
    State(state): State<AppState>,
    Json(request): Json<SweepRequest>,
) -> Result<Json<Vec<SweepPoint>>, (StatusCode, Json<ErrorBody>)> {
    let arrival_rates = logspace(
        SWEEP_ARRIVAL_RATE_MIN,
        SWEEP_ARRIVAL_RATE_MAX,
        SWEEP_ARRIVAL_RATE_POINTS,
    );

    let mut points = Vec::with_capacity(arrival_rates.len() * SWEEP_EXPIRATION_THRESHOLDS.len());
    for &arrival_rate in &arrival_rates {
        for &expiration_threshold in &SWEEP_EXPIRATION_THRESHOLDS {
            let params = SimParams {
                arrival_rate,
                warm_service_rate: request.warm_service_rate,
                cold_service_rate: request.cold_service_rate,
                expiration_threshold: Some(expiration_threshold),
                max_time: request.max_time,
                maximum_concurrency: request.maximum_concurrency,
                concurrency_value: request.concurrency_value,
                seed: request.seed,
            };
            let trace = state
                .worker_pool
                .submit(params)
                .await
                .map_err(error_response)?;
            let result = trace.result_dict(SkipInit::none());

            let utilization = result.inst_running_count_avg / result.inst_count_avg * 100.0;
            points.push(SweepPoint {
                arrival_rate,
                expiration_threshold,
                prob_cold_percent: result.prob_cold * 100.0,
                utilization_percent: if utilization.is_finite() {
                    Some(utilization)
                } else {
                    None
                },
            });
        }
    }

    Ok(Json(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logspace_covers_three_decades_with_ten_points() {
        let rates = logspace(1e-3, 1e1, 10);
        assert_eq!(rates.len(), 10);
        assert!((rates[0] - 1e-3).abs() < 1e-12);
        assert!((rates[9] - 1e1).abs() < 1e-9);
        for w in rates.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn sample_history_forces_index_zero_average_to_zero() {
        let mut trace = Trace::default();
        trace.hist_times = (0..100).map(|i| i as f64).collect();
        trace.hist_server_count = (0..100).map(|i| i % 5).collect();
        let (times, counts, avgs) = sample_history(&trace);
        assert!(times.len() <= MAX_SAMPLED_POINTS);
        assert_eq!(counts.len(), times.len());
        assert_eq!(avgs[0], 0.0);
    }
}
