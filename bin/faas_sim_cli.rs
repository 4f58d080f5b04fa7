//! Runs a single simulation from the terminal and prints a human-readable
//! summary — the Rust analogue of the original's `print_trace_results`.

use anyhow::Result;
use clap::Parser;
use faas_sim::{EngineConfig, SimulationEngine, SkipInit};

/// Run one discrete-event FaaS simulation and print its result summary.
#[derive(Parser)]
#[command(name = "faas-sim-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Request arrival rate (requests/sec), mean inter-arrival time 1/rate.
    #[arg(long)]
    arrival_rate: f64,

    /// Warm-instance service rate (requests/sec).
    #[arg(long)]
    warm_service_rate: f64,

    /// Cold-start service rate (requests/sec).
    #[arg(long)]
    cold_service_rate: f64,

    /// Seconds an idle instance is kept warm before being reclaimed.
    #[arg(long, default_value_t = faas_sim::engine::DEFAULT_EXPIRATION_THRESHOLD)]
    expiration_threshold: f64,

    /// Simulated horizon, in seconds.
    #[arg(long, default_value_t = faas_sim::engine::DEFAULT_MAX_TIME)]
    max_time: f64,

    /// Maximum number of concurrently running instances.
    #[arg(long, default_value_t = faas_sim::engine::DEFAULT_MAXIMUM_CONCURRENCY)]
    maximum_concurrency: usize,

    /// Concurrent requests one instance can serve at once. Omit for
    /// single-concurrency instances.
    #[arg(long)]
    concurrency_value: Option<usize>,

    /// RNG seed. A random seed is used if omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let settings = faas_sim::Settings::new().ok();
    faas_sim::logging::init(&settings.map(|s| s.log).unwrap_or_default());

    let cli = Cli::parse();

    let config = EngineConfig::from_rates(
        cli.arrival_rate,
        cli.warm_service_rate,
        cli.cold_service_rate,
        Some(cli.expiration_threshold),
        Some(cli.max_time),
        Some(cli.maximum_concurrency),
        cli.concurrency_value,
        cli.seed,
    )?;

    let mut engine = SimulationEngine::new(config);
    tracing::info!(seed = engine.seed(), "starting simulation run");
    let trace = engine.run()?;

    let result = trace.result_dict(SkipInit::none());

    println!(
        "Cold Starts / total requests: \t {} / {}",
        result.reqs_cold, result.reqs_total
    );
    println!("Cold Start Probability: \t {:.4}", result.prob_cold);
    println!(
        "Rejections / total requests: \t {} / {}",
        result.reqs_reject, result.reqs_total
    );
    println!("Rejection Probability: \t\t {:.4}", result.prob_reject);
    println!("Average Instance Life Span: \t {:.4}", result.lifespan_avg);
    println!("Average Server Count:  \t\t {:.4}", result.inst_count_avg);
    println!(
        "Average Running Count:  \t {:.4}",
        result.inst_running_count_avg
    );
    println!(
        "Average Idle Count:  \t\t {:.4}",
        result.inst_idle_count_avg
    );
    if let Some(conc) = result.conc_level_avg {
        println!("Average Concurrency Level:  \t {:.4}", conc);
    }

    Ok(())
}
