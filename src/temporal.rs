//! The temporal extension: starting a simulation from a pre-warmed fleet
//! instead of an empty one. This is a thin wrapper around
//! [`SimulationEngine::with_temporal_seed`] — everything past construction
//! (event loop, scheduler, accounting) is identical to a cold-started run.

use crate::engine::{EngineConfig, SimulationEngine};

/// The starting population for a temporal-extension run.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitialPopulation {
    /// Instances already serving a request at `t = 0`.
    pub running: usize,
    /// Instances already idle (warm, no in-flight request) at `t = 0`.
    pub idle: usize,
}

impl InitialPopulation {
    pub fn new(running: usize, idle: usize) -> Self {
        Self { running, idle }
    }
}

/// Builds an engine whose active set starts at `t = 0` with
/// `population.running` busy instances and `population.idle` idle ones,
/// rather than the empty fleet a fresh [`SimulationEngine::new`] starts
/// with. Counters and history are seeded consistently; from the first
/// history row onward the run behaves exactly like a cold-started one.
pub fn build_temporal_engine(
    config: EngineConfig,
    population: InitialPopulation,
) -> SimulationEngine {
    SimulationEngine::with_temporal_seed(config, population.running, population.idle)
}
