use std::sync::Arc;

use super::State;
use crate::error::{SimError, SimResult};
use crate::process::StochasticProcess;

/// A single-concurrency function instance: exactly one in-flight request at
/// a time. Cold start and warm reuse share the same `next_departure` /
/// `next_termination` bookkeeping; the only difference is which process
/// sampled the current departure.
#[derive(Debug)]
pub struct SingleInstance {
    pub creation_time: f64,
    pub state: State,
    pub is_busy: bool,
    pub is_cold: bool,
    warm_service_process: Arc<dyn StochasticProcess>,
    expiration_threshold: f64,
    pub next_departure: f64,
    pub next_termination: f64,
}

impl SingleInstance {
    /// Creates a new instance at time `t`, immediately entering `Cold` and
    /// sampling its first departure from the cold-service process.
    pub fn new(
        t: f64,
        cold_service_process: &dyn StochasticProcess,
        warm_service_process: Arc<dyn StochasticProcess>,
        expiration_threshold: f64,
        rng: &mut dyn rand::RngCore,
    ) -> Self {
        let next_departure = t + cold_service_process.sample(rng);
        Self {
            creation_time: t,
            state: State::Cold,
            is_busy: true,
            is_cold: true,
            warm_service_process,
            expiration_threshold,
            next_departure,
            next_termination: next_departure + expiration_threshold,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn get_life_span(&self) -> f64 {
        self.next_termination - self.creation_time
    }

    /// Assigns a new request to an idle instance. Fails if the instance is
    /// not idle — the engine must only route warm arrivals to instances the
    /// scheduler confirmed are idle.
    pub fn arrival_transition(&mut self, t: f64, rng: &mut dyn rand::RngCore) -> SimResult<()> {
        if self.state != State::Idle {
            return Err(SimError::BusyInstance);
        }
        self.state = State::Warm;
        self.is_busy = true;
        self.next_departure = t + self.warm_service_process.sample(rng);
        self.next_termination = self.next_departure + self.expiration_threshold;
        Ok(())
    }

    /// Advances the instance to its next lifecycle state. `Cold`/`Warm` both
    /// complete into `Idle` (the request finished); `Idle` expires into
    /// `Term`. `Term` is terminal and rejects further transitions.
    pub fn make_transition(&mut self) -> SimResult<State> {
        match self.state {
            State::Cold | State::Warm => {
                self.state = State::Idle;
                self.is_busy = false;
                self.is_cold = false;
                Ok(self.state)
            }
            State::Idle => {
                self.state = State::Term;
                Ok(self.state)
            }
            State::Term => Err(SimError::TerminatedInstance),
        }
    }

    /// Time remaining until this instance's next event: its termination
    /// deadline if idle, otherwise its in-flight departure.
    pub fn get_next_transition_time(&self, t: f64) -> SimResult<f64> {
        let deadline = if self.is_idle() {
            self.next_termination
        } else {
            self.next_departure
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ConstProcess;
    use rand::rngs::mock::StepRng;

    fn procs() -> (ConstProcess, Arc<dyn StochasticProcess>) {
        (
            ConstProcess::new(1.0).unwrap(),
            Arc::new(ConstProcess::new(2.0).unwrap()) as Arc<dyn StochasticProcess>,
        )
    }

    #[test]
    fn construct_sets_cold_state_and_termination_invariant() {
        let (cold, warm) = procs();
        let mut rng = StepRng::new(0, 1);
        let inst = SingleInstance::new(0.0, &cold, warm, 600.0, &mut rng);
        assert_eq!(inst.state, State::Cold);
        assert!(inst.is_busy);
        assert!(inst.is_cold);
        assert_eq!(inst.next_departure, 1.0);
        assert_eq!(inst.next_termination, inst.next_departure + 600.0);
    }

    #[test]
    fn arrival_transition_fails_unless_idle() {
        let (cold, warm) = procs();
        let mut rng = StepRng::new(0, 1);
        let mut inst = SingleInstance::new(0.0, &cold, warm, 600.0, &mut rng);
        assert!(inst.arrival_transition(0.5, &mut rng).is_err());
        inst.make_transition().unwrap(); // -> Idle
        assert!(inst.arrival_transition(0.5, &mut rng).is_ok());
        assert_eq!(inst.state, State::Warm);
    }

    #[test]
    fn make_transition_cycles_through_lifecycle_and_rejects_after_term() {
        let (cold, warm) = procs();
        let mut rng = StepRng::new(0, 1);
        let mut inst = SingleInstance::new(0.0, &cold, warm, 600.0, &mut rng);
        assert_eq!(inst.make_transition().unwrap(), State::Idle);
        assert!(!inst.is_cold);
        assert_eq!(inst.make_transition().unwrap(), State::Term);
        assert!(inst.make_transition().is_err());
    }

    #[test]
    fn get_next_transition_time_fails_past_deadline() {
        let (cold, warm) = procs();
        let mut rng = StepRng::new(0, 1);
        let inst = SingleInstance::new(0.0, &cold, warm, 600.0, &mut rng);
        assert!(inst.get_next_transition_time(inst.next_departure + 1.0).is_err());
        assert_eq!(inst.get_next_transition_time(0.0).unwrap(), 1.0);
    }
}
