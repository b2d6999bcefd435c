//! Structured logging setup for hosts embedding the archive crates.
//!
//! The library crates only emit `tracing` events; installing a subscriber is
//! left to the host application (or to tests).
//!
//! - stderr receives all log output (human or JSONL)
//! - events carry the archive identifier and run ID as fields

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn build_layer(config: &LogConfig) -> BoxedLayer {
    match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.targets)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Jsonl => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(config.targets)
            .with_current_span(false)
            .boxed(),
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    // RA_LOG was already folded into the config level.
    if std::env::var_os("RA_LOG").is_some() {
        return EnvFilter::new(config.directive());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()))
}

/// Install the global subscriber, failing if one is already set.
pub fn try_init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(build_layer(config))
        .with(build_filter(config))
        .try_init()
}

/// Install the global subscriber.
///
/// Call once at startup. A second call is ignored.
pub fn init_logging(config: &LogConfig) {
    if let Err(err) = try_init_logging(config) {
        eprintln!("logging already initialized: {}", err);
    }
}
