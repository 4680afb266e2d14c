//! Structured logging setup, grounded on `weavegraph::telemetry`'s
//! formatter-trait split but adapted to `tracing-subscriber` instead of a
//! bespoke render pipeline, since this crate emits `tracing` events rather
//! than owning its own terminal renderer.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Installs a global `tracing` subscriber from a [`LoggingConfig`].
///
/// Safe to call more than once per process: subsequent calls are no-ops
/// once a global subscriber is set, matching the common pattern of test
/// binaries calling this from every integration test's setup.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match config.format {
        LogFormat::Pretty => subscriber.with_ansi(true).try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };

    if result.is_err() {
        tracing::trace!("tracing subscriber already initialized");
    }
}
