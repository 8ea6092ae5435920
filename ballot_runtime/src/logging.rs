//! Global tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::{Result, RuntimeError};

/// Install a fmt subscriber. `RUST_LOG` overrides `default_directive`
/// when set. Logs go to stderr so command output stays clean.
pub fn init_logging(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| RuntimeError::Config(format!("bad log level {:?}: {}", default_directive, e)))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| RuntimeError::Config(format!("unable to set global subscriber: {}", e)))
}
