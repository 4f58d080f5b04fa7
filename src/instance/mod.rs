//! Function instance state machines: the simulated containers that serve
//! requests. Two variants share the same `State` lifecycle but differ in how
//! many in-flight requests they can hold at once — see [`single`] and
//! [`concurrent`].

mod concurrent;
mod single;

pub use concurrent::ConcurrentInstance;
pub use single::SingleInstance;

/// A stable identity for an instance inside the engine's active set.
///
/// Using an explicit id (rather than a `Vec` index) means termination can
/// remove an instance from the active collection without invalidating any
/// other instance's identity — see the "Instance identity under removal"
/// design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// Lifecycle state shared by both instance variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Serving the first request while the cold-start prelude runs.
    Cold,
    /// Serving a request using an already-warm runtime.
    Warm,
    /// No in-flight request; eligible for reuse or expiration.
    Idle,
    /// Terminated; must be removed from the active set.
    Term,
}

impl State {
    pub fn is_idle(&self) -> bool {
        matches!(self, State::Idle)
    }
}

use crate::error::SimResult;

/// Either instance variant, so the engine can drive one mixed active set
/// without duplicating the event loop per variant. The two variants'
/// internal departure bookkeeping stays separate (single absolute value vs.
/// multiset), as the design notes require; only the dispatch is unified.
#[derive(Debug)]
pub enum Instance {
    Single(SingleInstance),
    Concurrent(ConcurrentInstance),
}

impl Instance {
    pub fn creation_time(&self) -> f64 {
        match self {
            Instance::Single(i) => i.creation_time,
            Instance::Concurrent(i) => i.creation_time,
        }
    }

    pub fn is_idle(&self) -> bool {
        match self {
            Instance::Single(i) => i.is_idle(),
            Instance::Concurrent(i) => i.is_idle(),
        }
    }

    pub fn state(&self) -> State {
        match self {
            Instance::Single(i) => i.state,
            Instance::Concurrent(i) => i.state,
        }
    }

    pub fn get_life_span(&self) -> f64 {
        match self {
            Instance::Single(i) => i.get_life_span(),
            Instance::Concurrent(i) => i.get_life_span(),
        }
    }

    pub fn concurrency(&self) -> Option<usize> {
        match self {
            Instance::Single(_) => None,
            Instance::Concurrent(i) => Some(i.concurrency()),
        }
    }

    pub fn arrival_transition(&mut self, t: f64, rng: &mut dyn rand::RngCore) -> SimResult<()> {
        match self {
            Instance::Single(i) => i.arrival_transition(t, rng),
            Instance::Concurrent(i) => i.arrival_transition(t, rng),
        }
    }

    pub fn make_transition(&mut self) -> SimResult<State> {
        match self {
            Instance::Single(i) => i.make_transition(),
            Instance::Concurrent(i) => i.make_transition(),
        }
    }

    pub fn get_next_transition_time(&self, t: f64) -> SimResult<f64> {
        match self {
            Instance::Single(i) => i.get_next_transition_time(t),
            Instance::Concurrent(i) => i.get_next_transition_time(t),
        }
    }
}
