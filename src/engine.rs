//! The simulation engine: event loop, arrival/departure/expiration
//! handling, the warm-instance scheduler, and counter bookkeeping. See
//! [`crate::instance`] for the state machines it drives and [`crate::trace`]
//! for the history it produces.

use std::sync::Arc;

use indexmap::IndexMap;
use rand::{rngs::StdRng, SeedableRng};

use crate::error::{SimError, SimResult};
use crate::instance::{ConcurrentInstance, Instance, InstanceId, SingleInstance, State};
use crate::process::StochasticProcess;
use crate::trace::Trace;

pub const DEFAULT_EXPIRATION_THRESHOLD: f64 = 600.0;
pub const DEFAULT_MAX_TIME: f64 = 86_400.0;
pub const DEFAULT_MAXIMUM_CONCURRENCY: usize = 1000;

/// Engine construction parameters. `concurrency_value: Some(_)` selects the
/// multi-concurrency instance variant; `None` selects single-concurrency.
#[derive(Clone)]
pub struct EngineConfig {
    pub arrival_process: Arc<dyn StochasticProcess>,
    pub warm_service_process: Arc<dyn StochasticProcess>,
    pub cold_service_process: Arc<dyn StochasticProcess>,
    pub expiration_threshold: f64,
    pub max_time: f64,
    pub maximum_concurrency: usize,
    pub concurrency_value: Option<usize>,
    pub seed: Option<u64>,
}

impl EngineConfig {
    /// Builds a config from already-constructed processes, applying the
    /// defaults from §6 for anything left unset by the caller and
    /// validating the cross-field constraints (warm at least as fast as
    /// cold, non-zero fleet cap, etc).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arrival_process: Arc<dyn StochasticProcess>,
        warm_service_process: Arc<dyn StochasticProcess>,
        cold_service_process: Arc<dyn StochasticProcess>,
        expiration_threshold: f64,
        max_time: f64,
        maximum_concurrency: usize,
        concurrency_value: Option<usize>,
        seed: Option<u64>,
    ) -> SimResult<Self> {
        if warm_service_process.rate() < cold_service_process.rate() {
            return Err(SimError::InvalidConfiguration(format!(
                "warm_service_rate ({}) must be >= cold_service_rate ({}): warm service must be no slower than cold",
                warm_service_process.rate(),
                cold_service_process.rate()
            )));
        }
        if expiration_threshold < 0.0 {
            return Err(SimError::InvalidConfiguration(
                "expiration_threshold must be >= 0".into(),
            ));
        }
        if max_time <= 0.0 {
            return Err(SimError::InvalidConfiguration(
                "max_time must be > 0".into(),
            ));
        }
        if maximum_concurrency == 0 {
            return Err(SimError::InvalidConfiguration(
                "maximum_concurrency must be >= 1".into(),
            ));
        }
        if let Some(c) = concurrency_value {
            if c == 0 {
                return Err(SimError::InvalidConfiguration(
                    "concurrency_value must be >= 1".into(),
                ));
            }
        }
        Ok(Self {
            arrival_process,
            warm_service_process,
            cold_service_process,
            expiration_threshold,
            max_time,
            maximum_concurrency,
            concurrency_value,
            seed,
        })
    }

    /// Convenience constructor building exponential processes from rates,
    /// with §6's defaults applied to everything else.
    #[allow(clippy::too_many_arguments)]
    pub fn from_rates(
        arrival_rate: f64,
        warm_service_rate: f64,
        cold_service_rate: f64,
        expiration_threshold: Option<f64>,
        max_time: Option<f64>,
        maximum_concurrency: Option<usize>,
        concurrency_value: Option<usize>,
        seed: Option<u64>,
    ) -> SimResult<Self> {
        use crate::process::ExpProcess;
        let arrival = Arc::new(ExpProcess::new(arrival_rate)?);
        let warm = Arc::new(ExpProcess::new(warm_service_rate)?);
        let cold = Arc::new(ExpProcess::new(cold_service_rate)?);
        Self::new(
            arrival,
            warm,
            cold,
            expiration_threshold.unwrap_or(DEFAULT_EXPIRATION_THRESHOLD),
            max_time.unwrap_or(DEFAULT_MAX_TIME),
            maximum_concurrency.unwrap_or(DEFAULT_MAXIMUM_CONCURRENCY),
            concurrency_value,
            seed,
        )
    }
}

/// The discrete-event simulation engine. Owns the active instance set, the
/// clock, the seeded RNG, and the trace being accumulated.
pub struct SimulationEngine {
    config: EngineConfig,
    rng: StdRng,
    actual_seed: u64,
    t: f64,
    next_arrival: f64,
    next_id: u64,
    servers: IndexMap<InstanceId, Instance>,
    server_count: usize,
    running_count: usize,
    idle_count: usize,
    trace: Trace,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let actual_seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(actual_seed);
        let next_arrival = config.arrival_process.sample(&mut rng);
        Self {
            config,
            rng,
            actual_seed,
            t: 0.0,
            next_arrival,
            next_id: 0,
            servers: IndexMap::new(),
            server_count: 0,
            running_count: 0,
            idle_count: 0,
            trace: Trace::default(),
        }
    }

    /// Builds an engine pre-seeded with `n_running` already-busy instances
    /// and `n_idle` already-idle instances at `t = 0` — the temporal
    /// extension from §4, used to start a simulation from a warm fleet
    /// instead of an empty one.
    pub fn with_temporal_seed(config: EngineConfig, n_running: usize, n_idle: usize) -> Self {
        let mut engine = Self::new(config);
        for _ in 0..n_running {
            engine.spawn_seed_instance(false);
        }
        for _ in 0..n_idle {
            engine.spawn_seed_instance(true);
        }
        engine
    }

    fn spawn_seed_instance(&mut self, idle: bool) {
        let id = self.alloc_id();
        let mut inst = self.new_instance_at(0.0);
        // Drive a freshly-created instance straight to Idle so the
        // pre-seeded fleet looks like an already-warmed pool rather than
        // a fleet mid cold-start. These transitions never fail: a brand
        // new instance always starts non-idle and non-terminated.
        while !inst.is_idle() {
            inst.make_transition()
                .expect("freshly constructed seed instance cannot fail make_transition");
        }
        if idle {
            self.idle_count += 1;
        } else {
            // A seeded "running" instance is an already-warmed instance that
            // just picked up a request, not a fresh cold start: push it back
            // out of Idle via an arrival so its departure is sampled from the
            // warm service process.
            inst.arrival_transition(0.0, &mut self.rng)
                .expect("idle seed instance accepting an arrival cannot fail");
            self.running_count += 1;
        }
        self.server_count += 1;
        self.servers.insert(id, inst);
    }

    /// Clears the trace and the active set so the same engine can be rerun.
    /// The RNG is *not* reseeded — a fresh `SimulationEngine::new` is the
    /// way to get a bit-identical rerun.
    pub fn reset_trace(&mut self) {
        self.trace.reset();
        self.servers.clear();
        self.server_count = 0;
        self.running_count = 0;
        self.idle_count = 0;
        self.t = 0.0;
        self.next_arrival = self.config.arrival_process.sample(&mut self.rng);
    }

    pub fn seed(&self) -> u64 {
        self.actual_seed
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn server_count(&self) -> usize {
        self.server_count
    }

    pub fn running_count(&self) -> usize {
        self.running_count
    }

    pub fn idle_count(&self) -> usize {
        self.idle_count
    }

    fn alloc_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        id
    }

    fn new_instance_at(&mut self, t: f64) -> Instance {
        match self.config.concurrency_value {
            Some(concurrency_value) => Instance::Concurrent(ConcurrentInstance::new(
                t,
                self.config.cold_service_process.as_ref(),
                self.config.warm_service_process.clone(),
                self.config.expiration_threshold,
                concurrency_value,
                &mut self.rng,
            )),
            None => Instance::Single(SingleInstance::new(
                t,
                self.config.cold_service_process.as_ref(),
                self.config.warm_service_process.clone(),
                self.config.expiration_threshold,
                &mut self.rng,
            )),
        }
    }

    /// Runs the event loop to completion (`t >= max_time`) and returns the
    /// accumulated trace.
    pub fn run(&mut self) -> SimResult<&Trace> {
        while self.t < self.config.max_time {
            self.record_history_row();
            let hist_idx = self.trace.hist_times.len() - 1;

            if self.servers.is_empty() {
                self.t = self.next_arrival;
                self.resample_arrival();
                self.cold_arrival(hist_idx)?;
                continue;
            }

            let (chosen_id, dt_next) = self.next_transition()?;

            if self.next_arrival - self.t < dt_next {
                self.t = self.next_arrival;
                self.resample_arrival();
                if self.idle_count > 0 {
                    self.warm_arrival(hist_idx)?;
                } else {
                    self.cold_arrival(hist_idx)?;
                }
            } else {
                self.t += dt_next;
                self.apply_transition(chosen_id)?;
            }

            debug_assert_eq!(self.server_count, self.running_count + self.idle_count);
            debug_assert_eq!(self.server_count, self.servers.len());
        }

        self.record_history_row();
        Ok(&self.trace)
    }

    fn resample_arrival(&mut self) {
        self.next_arrival = self.t + self.config.arrival_process.sample(&mut self.rng);
    }

    fn record_history_row(&mut self) {
        self.trace.hist_times.push(self.t);
        self.trace.hist_server_count.push(self.server_count);
        self.trace.hist_running_count.push(self.running_count);
        self.trace.hist_idle_count.push(self.idle_count);

        if self.config.concurrency_value.is_some() {
            if self.servers.is_empty() {
                self.trace.hist_conc_avgs.push(-1.0);
            } else {
                let total: usize = self
                    .servers
                    .values()
                    .filter_map(|i| i.concurrency())
                    .sum();
                self.trace
                    .hist_conc_avgs
                    .push(total as f64 / self.servers.len() as f64);
            }
        }
    }

    /// Scans every active instance's next transition time and returns the
    /// earliest, breaking ties by first insertion-order occurrence (the
    /// `IndexMap` iteration order already implements this).
    fn next_transition(&self) -> SimResult<(InstanceId, f64)> {
        let mut best: Option<(InstanceId, f64)> = None;
        for (&id, inst) in self.servers.iter() {
            let dt = inst.get_next_transition_time(self.t)?;
            best = match best {
                Some((_, best_dt)) if dt >= best_dt => best,
                _ => Some((id, dt)),
            };
        }
        Ok(best.expect("next_transition is only called when servers is non-empty"))
    }

    fn apply_transition(&mut self, id: InstanceId) -> SimResult<()> {
        let new_state = {
            let inst = self
                .servers
                .get_mut(&id)
                .expect("id came from a scan over the current active set");
            inst.make_transition()?
        };
        match new_state {
            State::Term => {
                let inst = self
                    .servers
                    .shift_remove(&id)
                    .expect("id came from a scan over the current active set");
                self.trace.lifespans.push(inst.get_life_span());
                self.idle_count -= 1;
                self.server_count -= 1;
            }
            State::Idle => {
                self.running_count -= 1;
                self.idle_count += 1;
            }
            // Only reachable for the concurrency variant: the cold prelude
            // ending (Cold -> Warm) or draining one of several concurrent
            // in-flight requests while others remain (Warm -> Warm) neither
            // frees nor claims a running slot.
            State::Warm => {}
            State::Cold => {
                return Err(SimError::InvalidConfiguration(
                    "make_transition must never produce Cold".into(),
                ))
            }
        }
        Ok(())
    }

    /// Among all idle instances, picks the one with the largest
    /// `creation_time` (newest-first), ties broken by first occurrence.
    fn schedule_idle_instance(&self) -> Option<InstanceId> {
        let mut best: Option<(InstanceId, f64)> = None;
        for (&id, inst) in self.servers.iter() {
            if !inst.is_idle() {
                continue;
            }
            let ct = inst.creation_time();
            best = match best {
                Some((_, best_ct)) if ct <= best_ct => best,
                _ => Some((id, ct)),
            };
        }
        best.map(|(id, _)| id)
    }

    fn cold_arrival(&mut self, hist_idx: usize) -> SimResult<()> {
        self.trace.total_req += 1;
        if self.running_count == self.config.maximum_concurrency {
            self.trace.total_reject += 1;
            self.trace.hist_req_rej_idxs.push(hist_idx);
            return Ok(());
        }
        self.trace.total_cold += 1;
        self.trace.hist_req_cold_idxs.push(hist_idx);

        let id = self.alloc_id();
        let inst = self.new_instance_at(self.t);
        self.servers.insert(id, inst);
        self.server_count += 1;
        self.running_count += 1;
        Ok(())
    }

    fn warm_arrival(&mut self, hist_idx: usize) -> SimResult<()> {
        self.trace.total_req += 1;
        if self.running_count == self.config.maximum_concurrency {
            self.trace.total_reject += 1;
            self.trace.hist_req_rej_idxs.push(hist_idx);
            return Ok(());
        }

        let id = self
            .schedule_idle_instance()
            .expect("warm_arrival is only dispatched when idle_count > 0");
        self.servers
            .get_mut(&id)
            .expect("id just came from schedule_idle_instance")
            .arrival_transition(self.t, &mut self.rng)?;

        self.trace.total_warm += 1;
        self.trace.hist_req_warm_idxs.push(hist_idx);
        self.idle_count -= 1;
        self.running_count += 1;
        Ok(())
    }
}
