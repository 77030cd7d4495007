//! Subscriber installation for binaries and tests.
//!
//! The library itself only emits `tracing` events; nothing is printed unless a
//! caller installs a subscriber.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{LinkPredError, Result};

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level` when it is set and valid.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| LinkPredError::InvalidArgument(format!("invalid log level: {e}")))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| LinkPredError::InvalidArgument("logging already initialized".into()))
}
