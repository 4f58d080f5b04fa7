//! # faas-sim
//!
//! A discrete-event simulator for serverless (Function-as-a-Service)
//! platforms. It reproduces, at workload-trace granularity, how a fleet of
//! function instances is created, reused, held warm, and reclaimed in
//! response to a stream of requests, and reports operational metrics:
//! cold-start probability, rejection probability, average instance counts,
//! average lifespan, and time-weighted state residency.
//!
//! ## Architecture
//!
//! ### Core
//! The discrete-event engine: a global clock advanced to the earliest of
//! the next arrival, departure, or expiration; the instance state machine
//! (single- and multi-concurrency variants); the newest-idle-first
//! scheduler; and the trace-accounting layer that turns raw history into
//! time-weighted aggregates.
//!
//! ### Ambient stack
//! Configuration, error handling, an HTTP surface, and a worker pool for
//! running many independent simulations in parallel — none of it touches
//! simulation state, all of it follows from running the core as a service.

// Core simulation engine
/// Stochastic inter-event duration samplers (exponential, constant, Gaussian).
pub mod process;
/// Function instance state machines (single- and multi-concurrency).
pub mod instance;
/// The discrete-event engine: event loop, scheduler, counter bookkeeping.
pub mod engine;
/// Pre-seeding an engine with a starting population instead of an empty fleet.
pub mod temporal;
/// History arrays, time-weighted averages, and result dictionary assembly.
pub mod trace;

// Ambient infrastructure
/// The unified simulation error type.
pub mod error;
/// Histogram-to-density conversion for process validation.
pub mod utils;
/// Layered (file + env) typed configuration.
pub mod settings;
/// `tracing` subscriber setup shared by the binaries.
pub mod logging;
/// Prometheus metrics, behind the `observability` feature.
pub mod metrics;
/// The wire format for a single simulation request.
pub mod params;
/// The in-process worker pool running independent simulations concurrently.
pub mod worker;
/// The `axum` HTTP surface: single-run, sweep, and health endpoints.
pub mod api;

pub use api::{create_router, AppState};
pub use engine::{EngineConfig, SimulationEngine};
pub use error::{SimError, SimResult};
pub use instance::{ConcurrentInstance, Instance, InstanceId, SingleInstance, State};
pub use params::SimParams;
pub use process::{ConstProcess, ExpProcess, GaussianProcess, StochasticProcess};
pub use settings::Settings;
pub use temporal::{build_temporal_engine, InitialPopulation};
pub use trace::{PerStateCounts, ResultDict, SkipInit, Trace};
pub use worker::WorkerPoolHandle;
