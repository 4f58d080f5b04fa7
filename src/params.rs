//! The wire format for a single simulation request: what crosses the HTTP
//! boundary and what a worker-pool job carries. Distinct from
//! [`crate::engine::EngineConfig`] because this type is `serde`-friendly
//! (plain rates, not `Arc<dyn StochasticProcess>`) and carries the input
//! bounds validation the HTTP surface enforces.

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SimParams {
    pub arrival_rate: f64,
    pub warm_service_rate: f64,
    pub cold_service_rate: f64,
    #[serde(default)]
    pub expiration_threshold: Option<f64>,
    #[serde(default)]
    pub max_time: Option<f64>,
    #[serde(default)]
    pub maximum_concurrency: Option<usize>,
    #[serde(default)]
    pub concurrency_value: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

const MAX_ARRIVAL_RATE: f64 = 10.0;
const MAX_SERVICE_TIME: f64 = 1000.0;
const MAX_MAX_TIME: f64 = 1_000_000.0;

impl SimParams {
    /// Applies the HTTP surface's input bounds: `0 < arrival_rate <= 10`,
    /// `0 < service_time <= 1000`, `0 < max_time <= 10^6`. Service times here
    /// are means (`1/rate`), so the bound is checked on `1/rate`.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.arrival_rate > 0.0 && self.arrival_rate <= MAX_ARRIVAL_RATE) {
            return Err(SimError::InvalidConfiguration(format!(
                "arrival_rate must be in (0, {MAX_ARRIVAL_RATE}], got {}",
                self.arrival_rate
            )));
        }
        for (label, rate) in [
            ("warm_service_rate", self.warm_service_rate),
            ("cold_service_rate", self.cold_service_rate),
        ] {
            if !(rate > 0.0) {
                return Err(SimError::InvalidConfiguration(format!(
                    "{label} must be > 0, got {rate}"
                )));
            }
            let service_time = 1.0 / rate;
            if !(service_time > 0.0 && service_time <= MAX_SERVICE_TIME) {
                return Err(SimError::InvalidConfiguration(format!(
                    "{label}'s implied service time (1/rate = {service_time}) must be in (0, {MAX_SERVICE_TIME}]"
                )));
            }
        }
        if let Some(max_time) = self.max_time {
            if !(max_time > 0.0 && max_time <= MAX_MAX_TIME) {
                return Err(SimError::InvalidConfiguration(format!(
                    "max_time must be in (0, {MAX_MAX_TIME}], got {max_time}"
                )));
            }
        }
        Ok(())
    }

    pub fn to_engine_config(self) -> SimResult<EngineConfig> {
        self.validate()?;
        EngineConfig::from_rates(
            self.arrival_rate,
            self.warm_service_rate,
            self.cold_service_rate,
            self.expiration_threshold,
            self.max_time,
            self.maximum_concurrency,
            self.concurrency_value,
            self.seed,
        )
    }
}
