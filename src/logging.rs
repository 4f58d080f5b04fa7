//! `tracing` subscriber setup shared by all three binaries.

use tracing_subscriber::EnvFilter;

use crate::settings::{LogFormat, LogSettings};

/// Installs a global `tracing` subscriber filtered by `log.level` (or
/// `RUST_LOG`, if set) and formatted per `log.format`.
pub fn init(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}
