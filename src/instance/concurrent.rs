use std::sync::Arc;

use super::State;
use crate::error::{SimError, SimResult};
use crate::process::StochasticProcess;

/// A multi-concurrency function instance: up to `concurrency_value` in-flight
/// requests share one warm runtime after a single cold-start prelude.
/// `next_departure` is a multiset of absolute completion times rather than a
/// single value.
#[derive(Debug)]
pub struct ConcurrentInstance {
    pub creation_time: f64,
    pub state: State,
    pub is_cold: bool,
    concurrency_value: usize,
    warm_service_process: Arc<dyn StochasticProcess>,
    expiration_threshold: f64,
    pub cold_end: f64,
    pub next_departure: Vec<f64>,
    pub next_termination: f64,
}

impl ConcurrentInstance {
    pub fn new(
        t: f64,
        cold_service_process: &dyn StochasticProcess,
        warm_service_process: Arc<dyn StochasticProcess>,
        expiration_threshold: f64,
        concurrency_value: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Self {
        let cold_end = t + cold_service_process.sample(rng);
        let first_departure = cold_end + warm_service_process.sample(rng);
        let next_termination = first_departure + expiration_threshold;
        Self {
            creation_time: t,
            state: State::Cold,
            is_cold: true,
            concurrency_value,
            warm_service_process,
            expiration_threshold,
            cold_end,
            next_departure: vec![first_departure],
            next_termination,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn get_life_span(&self) -> f64 {
        self.next_termination - self.creation_time
    }

    fn running_reqs(&self) -> usize {
        self.next_departure.len()
    }

    pub fn concurrency(&self) -> usize {
        self.running_reqs()
    }

    /// Ready iff there is spare concurrency for one more in-flight request.
    pub fn is_ready(&self) -> bool {
        self.running_reqs() < self.concurrency_value
    }

    fn recompute_termination(&mut self) {
        let max_departure = self
            .next_departure
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max);
        self.next_termination = max_departure + self.expiration_threshold;
    }

    /// Admits a new request. When `Cold`/`Warm` and ready, appends a new
    /// departure sampled from `max(t, cold_end)` (a request can't complete
    /// before the cold-start prelude finishes). When `Idle`, behaves like
    /// the single-concurrency variant with a fresh one-element multiset.
    pub fn arrival_transition(&mut self, t: f64, rng: &mut dyn rand::RngCore) -> SimResult<()> {
        match self.state {
            State::Cold | State::Warm => {
                if !self.is_ready() {
                    return Err(SimError::AtCapacity);
                }
                let departure = t.max(self.cold_end) + self.warm_service_process.sample(rng);
                self.next_departure.push(departure);
                self.recompute_termination();
                Ok(())
            }
            State::Idle => {
                self.state = State::Warm;
                let departure = t + self.warm_service_process.sample(rng);
                self.next_departure = vec![departure];
                self.recompute_termination();
                Ok(())
            }
            State::Term => Err(SimError::TerminatedInstance),
        }
    }

    /// `Cold` -> `Warm` once the cold prelude ends. `Warm` with more than one
    /// in-flight request removes the earliest departure and stays `Warm`;
    /// with exactly one, removes it and becomes `Idle`. `Idle` -> `Term`.
    pub fn make_transition(&mut self) -> SimResult<State> {
        match self.state {
            State::Cold => {
                self.state = State::Warm;
                self.is_cold = false;
                Ok(self.state)
            }
            State::Warm => {
                let (min_idx, _) = self
                    .next_departure
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.partial_cmp(b.1).expect("departure times are never NaN"))
                    .expect("Warm state always has at least one in-flight departure");
                self.next_departure.remove(min_idx);
                if self.next_departure.is_empty() {
                    self.state = State::Idle;
                } else {
                    self.recompute_termination();
                }
                Ok(self.state)
            }
            State::Idle => {
                self.state = State::Term;
                Ok(self.state)
            }
            State::Term => Err(SimError::TerminatedInstance),
        }
    }

    /// `Idle` -> time to termination; `Cold` -> time to the cold prelude
    /// ending; `Warm` -> time to the earliest in-flight departure.
    pub fn get_next_transition_time(&self, t: f64) -> SimResult<f64> {
        let deadline = match self.state {
            State::Idle => self.next_termination,
            State::Cold => self.cold_end,
            State::Warm => self
                .next_departure
                .iter()
                .cloned()
                .fold(f64::MAX, f64::min),
            State::Term => return Err(SimError::TerminatedInstance),
        };
        if t > deadline {
            return Err(SimError::ClockPastDeadline {
                queried: t,
                deadline,
            });
        }
        Ok(deadline - t)
    }
}
