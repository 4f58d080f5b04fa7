//! The worker pool: a fixed-size set of `tokio` tasks that run independent
//! simulations to completion and hand the result back. This is the
//! in-process analogue of the original message-socket worker protocol (see
//! DESIGN.md) — a request frame becomes a `Job` sent over an `mpsc` channel,
//! a reply frame becomes a value sent back over a `oneshot` channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info};

use crate::engine::SimulationEngine;
use crate::error::{SimError, SimResult};
use crate::params::SimParams;
use crate::trace::Trace;

struct Job {
    id: u64,
    params: SimParams,
    reply: oneshot::Sender<SimResult<Trace>>,
}

/// A handle to a running worker pool. Cloning it is cheap — every clone
/// shares the same job queue and stop flag.
#[derive(Clone)]
pub struct WorkerPoolHandle {
    sender: mpsc::Sender<Job>,
    next_job_id: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
}

impl WorkerPoolHandle {
    /// Spawns `pool_size` worker tasks sharing one job queue.
    pub fn spawn(pool_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(1024);
        let receiver = Arc::new(Mutex::new(receiver));
        let stop = Arc::new(AtomicBool::new(false));

        for worker_id in 0..pool_size {
            tokio::spawn(worker_loop(worker_id, receiver.clone(), stop.clone()));
        }

        info!(pool_size, "worker pool started");
        Self {
            sender,
            next_job_id: Arc::new(AtomicU64::new(0)),
            stop,
        }
    }

    /// Submits one simulation job and awaits its result. Runs the
    /// engine-construction/validation step eagerly so callers can reject a
    /// bad request without waiting on a worker, then leaves the actual
    /// (CPU-bound) run to a worker task.
    pub async fn submit(&self, params: SimParams) -> SimResult<Trace> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let job = Job {
            id,
            params,
            reply: reply_tx,
        };
        self.sender
            .send(job)
            .await
            .map_err(|_| SimError::InvalidConfiguration("worker pool has shut down".into()))?;
        reply_rx
            .await
            .map_err(|_| SimError::InvalidConfiguration("worker dropped its reply".into()))?
    }

    /// Cooperative shutdown: workers check this flag between jobs and stop
    /// picking up new ones. A job already in flight always runs to
    /// completion.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    stop: Arc<AtomicBool>,
) {
    loop {
        if stop.load(Ordering::Relaxed) {
            debug!(worker_id, "worker observed stop flag, exiting");
            break;
        }

        let job = {
            let mut receiver = receiver.lock().await;
            receiver.recv().await
        };
        let Some(Job { id, params, reply }) = job else {
            break;
        };

        debug!(worker_id, job_id = id, "running simulation job");
        let outcome = tokio::task::spawn_blocking(move || run_to_completion(params))
            .await
            .unwrap_or_else(|_| {
                Err(SimError::InvalidConfiguration(
                    "simulation task panicked".into(),
                ))
            });
        let _ = reply.send(outcome);
    }
}

/// Builds a fresh, process-wide-state-free engine from `params` and runs it
/// to completion. Every job gets its own RNG (seeded from `params.seed` or
/// randomly) — workers never share simulation state.
fn run_to_completion(params: SimParams) -> SimResult<Trace> {
    let config = params.to_engine_config()?;
    let mut engine = SimulationEngine::new(config);
    engine.run()?;
    Ok(engine.trace().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SimParams {
        SimParams {
            arrival_rate: 1.0,
            warm_service_rate: 2.0,
            cold_service_rate: 1.0,
            expiration_threshold: Some(60.0),
            max_time: Some(500.0),
            maximum_concurrency: Some(10),
            concurrency_value: None,
            seed: Some(3),
        }
    }

    #[tokio::test]
    async fn submitted_job_returns_a_completed_trace() {
        let pool = WorkerPoolHandle::spawn(2);
        let trace = pool.submit(params()).await.unwrap();
        assert!(!trace.hist_times.is_empty());
    }

    #[tokio::test]
    async fn invalid_params_surface_as_an_error_without_blocking_a_worker() {
        let pool = WorkerPoolHandle::spawn(1);
        let mut bad = params();
        bad.arrival_rate = -1.0;
        assert!(pool.submit(bad).await.is_err());
    }

    #[tokio::test]
    async fn many_concurrent_jobs_all_complete() {
        let pool = WorkerPoolHandle::spawn(4);
        let mut handles = Vec::new();
        for seed in 0..8 {
            let pool = pool.clone();
            let mut p = params();
            p.seed = Some(seed);
            handles.push(tokio::spawn(async move { pool.submit(p).await }));
        }
        for h in handles {
            assert!(h.await.unwrap().is_ok());
        }
    }
}
