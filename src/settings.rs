use std::env;
use std::sync::Arc;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::engine::{
    EngineConfig, DEFAULT_EXPIRATION_THRESHOLD, DEFAULT_MAXIMUM_CONCURRENCY, DEFAULT_MAX_TIME,
};
use crate::error::SimResult;
use crate::process::{ConstProcess, ExpProcess, GaussianProcess, StochasticProcess};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// One of the three stochastic processes, as written in config: a `kind` tag
/// plus the parameters that kind needs.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProcessSpec {
    Exponential { rate: f64 },
    Constant { rate: f64 },
    Gaussian { rate: f64, std_dev: f64 },
}

impl ProcessSpec {
    pub fn build(&self) -> SimResult<Arc<dyn StochasticProcess>> {
        Ok(match *self {
            ProcessSpec::Exponential { rate } => Arc::new(ExpProcess::new(rate)?),
            ProcessSpec::Constant { rate } => Arc::new(ConstProcess::new(rate)?),
            ProcessSpec::Gaussian { rate, std_dev } => {
                Arc::new(GaussianProcess::new(rate, std_dev)?)
            }
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationSettings {
    pub arrival: ProcessSpec,
    pub warm_service: ProcessSpec,
    pub cold_service: ProcessSpec,
    #[serde(default = "default_expiration_threshold")]
    pub expiration_threshold: f64,
    #[serde(default = "default_max_time")]
    pub max_time: f64,
    #[serde(default = "default_maximum_concurrency")]
    pub maximum_concurrency: usize,
    #[serde(default)]
    pub concurrency_value: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_expiration_threshold() -> f64 {
    DEFAULT_EXPIRATION_THRESHOLD
}

fn default_max_time() -> f64 {
    DEFAULT_MAX_TIME
}

fn default_maximum_concurrency() -> usize {
    DEFAULT_MAXIMUM_CONCURRENCY
}

impl SimulationSettings {
    pub fn build_engine_config(&self) -> SimResult<EngineConfig> {
        EngineConfig::new(
            self.arrival.build()?,
            self.warm_service.build()?,
            self.cold_service.build()?,
            self.expiration_threshold,
            self.max_time,
            self.maximum_concurrency,
            self.concurrency_value,
            self.seed,
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerSettings {
    #[serde(default = "default_worker_pool_size")]
    pub pool_size: usize,
}

fn default_worker_pool_size() -> usize {
    4
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            pool_size: default_worker_pool_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetricsSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9100
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl Settings {
    /// Loads settings from `FAASSIM_CONFIG` (default `Config.toml`, missing
    /// file tolerated — every ambient section has defaults; only
    /// `[simulation]` is mandatory), then applies a handful of `FAASSIM_*`
    /// environment overrides for knobs operators commonly flip per-deployment.
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = env::var("FAASSIM_CONFIG").unwrap_or_else(|_| "Config.toml".to_string());
        let built = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .build()?;

        let mut settings: Self = built.try_deserialize()?;

        if let Ok(level) = env::var("FAASSIM_LOG_LEVEL") {
            settings.log.level = level;
        }
        if let Ok(bind_address) = env::var("FAASSIM_HTTP_BIND_ADDRESS") {
            settings.http.bind_address = bind_address;
        }
        if let Ok(raw) = env::var("FAASSIM_WORKER_POOL_SIZE") {
            if let Ok(pool_size) = raw.parse() {
                settings.worker.pool_size = pool_size;
            }
        }
        if let Ok(raw) = env::var("FAASSIM_SEED") {
            if let Ok(seed) = raw.parse() {
                settings.simulation.seed = Some(seed);
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn process_spec_deserializes_from_toml_and_builds() {
        let toml = r#"
            kind = "exponential"
            rate = 1.5
        "#;
        let built = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap();
        let spec: ProcessSpec = built.try_deserialize().unwrap();
        assert!(matches!(spec, ProcessSpec::Exponential { rate } if rate == 1.5));
        assert!(spec.build().is_ok());
    }

    #[test]
    fn simulation_settings_applies_defaults_for_omitted_fields() {
        let toml = r#"
            [arrival]
            kind = "exponential"
            rate = 0.9

            [warm_service]
            kind = "exponential"
            rate = 1.0

            [cold_service]
            kind = "exponential"
            rate = 0.5
        "#;
        let built = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap();
        let settings: SimulationSettings = built.try_deserialize().unwrap();
        assert_eq!(settings.expiration_threshold, DEFAULT_EXPIRATION_THRESHOLD);
        assert_eq!(settings.max_time, DEFAULT_MAX_TIME);
        assert_eq!(settings.maximum_concurrency, DEFAULT_MAXIMUM_CONCURRENCY);
        assert!(settings.build_engine_config().is_ok());
    }

    #[test]
    fn missing_config_file_still_deserializes_via_defaults_and_required_fields() {
        let toml = r#"
            [simulation.arrival]
            kind = "exponential"
            rate = 0.9
            [simulation.warm_service]
            kind = "exponential"
            rate = 1.0
            [simulation.cold_service]
            kind = "exponential"
            rate = 0.5
        "#;
        let built = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap();
        let settings: Settings = built.try_deserialize().unwrap();
        assert_eq!(settings.http.bind_address, default_bind_address());
        assert_eq!(settings.worker.pool_size, default_worker_pool_size());
    }
}
