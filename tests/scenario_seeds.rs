//! The six scenario seeds from §8: fixed parameter/seed combinations with a
//! known qualitative (sometimes quantitative) outcome.

use approx::assert_relative_eq;
use faas_sim::{EngineConfig, SimParams, SimulationEngine};

fn engine_from_rates(
    arrival_rate: f64,
    warm_service_rate: f64,
    cold_service_rate: f64,
    expiration_threshold: f64,
    max_time: f64,
    maximum_concurrency: usize,
    concurrency_value: Option<usize>,
    seed: u64,
) -> SimulationEngine {
    let config = EngineConfig::from_rates(
        arrival_rate,
        warm_service_rate,
        cold_service_rate,
        Some(expiration_threshold),
        Some(max_time),
        Some(maximum_concurrency),
        concurrency_value,
        Some(seed),
    )
    .unwrap();
    SimulationEngine::new(config)
}

/// Seed 1: a warm pool that stabilizes quickly keeps cold-start probability
/// low.
#[test]
fn seed_1_stabilized_warm_pool_has_low_cold_probability() {
    let mut engine = engine_from_rates(
        0.9,
        1.0 / 2.016,
        1.0 / 2.163,
        600.0,
        100_000.0,
        1000,
        None,
        101,
    );
    let trace = engine.run().unwrap();
    let result = trace.result_dict(faas_sim::SkipInit::none());
    assert!(
        result.prob_cold < 0.01,
        "prob_cold={} should be under 1%",
        result.prob_cold
    );
}

/// Seed 2: zero expiration threshold means no instance is ever reused, so
/// every request is a cold start.
#[test]
fn seed_2_zero_expiration_threshold_forces_near_certain_cold_start() {
    let mut engine = engine_from_rates(10.0, 1.0, 1.0, 0.0, 100.0, 1000, None, 202);
    let trace = engine.run().unwrap();
    let result = trace.result_dict(faas_sim::SkipInit::none());
    assert!(
        result.prob_cold > 0.95,
        "prob_cold={} should be near 1",
        result.prob_cold
    );
}

/// Seed 3: a fleet cap of 2 under a much higher arrival rate rejects almost
/// everything, and running_count never exceeds the cap.
#[test]
fn seed_3_tight_concurrency_cap_causes_heavy_rejection() {
    let mut engine = engine_from_rates(100.0, 1.0, 1.0, 60.0, 100.0, 2, None, 303);
    let trace = engine.run().unwrap();
    let result = trace.result_dict(faas_sim::SkipInit::none());
    assert!(
        result.prob_reject > 0.9,
        "prob_reject={} should be over 90%",
        result.prob_reject
    );
    assert!(trace.hist_running_count.iter().all(|&c| c <= 2));
}

/// Seed 4: a temporal start with 5 idle, 3 running instances means the first
/// several arrivals find an idle instance waiting rather than cold-starting.
#[test]
fn seed_4_temporal_start_serves_initial_arrivals_warm() {
    let config =
        EngineConfig::from_rates(0.9, 1.0, 1.0, Some(600.0), Some(300.0), Some(1000), None, Some(404))
            .unwrap();
    let mut engine = SimulationEngine::with_temporal_seed(config, 3, 5);
    let trace = engine.run().unwrap();

    let mut tagged: Vec<(usize, &str)> = Vec::new();
    tagged.extend(trace.hist_req_cold_idxs.iter().map(|&i| (i, "cold")));
    tagged.extend(trace.hist_req_warm_idxs.iter().map(|&i| (i, "warm")));
    tagged.extend(trace.hist_req_rej_idxs.iter().map(|&i| (i, "reject")));
    tagged.sort_by_key(|&(i, _)| i);

    let first_eight: Vec<&str> = tagged.iter().take(8).map(|&(_, kind)| kind).collect();
    assert!(
        first_eight.iter().all(|&kind| kind == "warm"),
        "expected the first 8 arrivals to be warm, got {first_eight:?}"
    );
}

/// Seed 5: the concurrency variant under a balanced arrival/service rate
/// keeps time-averaged per-instance concurrency near 1.
#[test]
fn seed_5_concurrent_variant_keeps_concurrency_near_one() {
    let mut engine = engine_from_rates(4.0, 1.0, 1.0, 60.0, 5_000.0, 1000, Some(4), 505);
    let trace = engine.run().unwrap();
    let avg_conc = trace
        .average_concurrency(faas_sim::SkipInit::none())
        .expect("concurrency variant always populates hist_conc_avgs");
    assert_relative_eq!(avg_conc, 1.0, max_relative = 0.5);
}

/// Seed 6: sweeping arrival rate upward (holding expiration threshold fixed)
/// trends cold-start probability downward, since a higher arrival rate keeps
/// the warm pool from expiring between requests.
#[test]
fn seed_6_higher_arrival_rate_trends_toward_lower_cold_probability() {
    let rates = [1e-2, 1e-1, 1.0, 10.0];
    let mut cold_probs = Vec::new();
    for (i, &rate) in rates.iter().enumerate() {
        let params = SimParams {
            arrival_rate: rate,
            warm_service_rate: 1.0,
            cold_service_rate: 1.0,
            expiration_threshold: Some(60.0),
            max_time: Some(5_000.0),
            maximum_concurrency: Some(1000),
            concurrency_value: None,
            seed: Some(600 + i as u64),
        };
        let config = params.to_engine_config().unwrap();
        let mut engine = SimulationEngine::new(config);
        let trace = engine.run().unwrap();
        cold_probs.push(trace.result_dict(faas_sim::SkipInit::none()).prob_cold);
    }
    assert!(
        cold_probs[0] > cold_probs[cold_probs.len() - 1],
        "cold probability at the lowest rate ({}) should exceed the highest rate ({})",
        cold_probs[0],
        cold_probs[cold_probs.len() - 1]
    );
}
