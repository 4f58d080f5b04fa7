//! Standalone worker-pool runner: reads a JSON array of simulation requests
//! from a file, runs them concurrently against an in-process worker pool,
//! and prints the resulting result dictionaries as a JSON array.
//!
//! The in-process pool in [`faas_sim::worker`] has no network transport of
//! its own (see DESIGN.md); this binary is the batch-submission entry point
//! for it, analogous to running the original's worker process against a
//! pre-built job list instead of a live socket.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use faas_sim::{SimParams, SkipInit, WorkerPoolHandle};
use serde_json::Value;

/// Run a batch of simulation jobs through an in-process worker pool.
#[derive(Parser)]
#[command(name = "faas-sim-worker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON file containing an array of simulation request objects.
    #[arg(long)]
    jobs: PathBuf,

    /// Number of worker tasks to run jobs concurrently on.
    #[arg(long, default_value_t = 4)]
    pool_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let settings = faas_sim::Settings::new().ok();
    faas_sim::logging::init(&settings.map(|s| s.log).unwrap_or_default());

    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.jobs)
        .with_context(|| format!("reading jobs file {}", cli.jobs.display()))?;
    let jobs: Vec<SimParams> =
        serde_json::from_str(&raw).with_context(|| "jobs file must be a JSON array of request objects")?;

    tracing::info!(count = jobs.len(), pool_size = cli.pool_size, "submitting jobs");
    let pool = WorkerPoolHandle::spawn(cli.pool_size);

    let mut handles = Vec::with_capacity(jobs.len());
    for params in jobs {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.submit(params).await }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle.await.context("worker task panicked")?;
        let value = match outcome {
            Ok(trace) => serde_json::to_value(trace.result_dict(SkipInit::none()))?,
            Err(err) => serde_json::json!({ "error": err.to_string() }),
        };
        results.push(value);
    }

    pool.request_stop();

    let output = Value::Array(results);
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
