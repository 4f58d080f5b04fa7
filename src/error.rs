use thiserror::Error;

/// Errors raised by the simulation core and its ambient collaborators.
///
/// The bug-class variants (`BusyInstance`, `AtCapacity`, `TerminatedInstance`,
/// `ClockPastDeadline`) indicate an invariant violation inside the engine and
/// are never expected in a correct run; they abort the simulation. `InvalidConfiguration`
/// is the only variant a caller can trigger by supplying bad parameters.
/// Rejection is **not** represented here — it is a first-class accounted outcome,
/// not an error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("arrival_transition called on a busy instance (state must be IDLE)")]
    BusyInstance,

    #[error("arrival_transition called on an instance already at its concurrency limit")]
    AtCapacity,

    #[error("make_transition called on a terminated instance")]
    TerminatedInstance,

    #[error("queried a deadline at t={queried} that is already past the instance's deadline {deadline}")]
    ClockPastDeadline { queried: f64, deadline: f64 },

    #[error("configuration loading failed: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
