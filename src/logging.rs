//! Logging setup
//!
//! The library itself only emits `tracing` events; embedding applications
//! call [`init`] once to print them.

use tracing_subscriber::{EnvFilter, fmt};
use crate::error::{AttpError, Result};

/// Build the filter: `RUST_LOG` if set, otherwise `default_filter`
pub fn env_filter(default_filter: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| AttpError::ConfigError(format!("Invalid log filter '{}': {}", default_filter, e))),
    }
}

/// Install a global fmt subscriber
///
/// Fails instead of panicking if a global subscriber is already installed.
pub fn init(default_filter: &str) -> Result<()> {
    let filter = env_filter(default_filter)?;
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| AttpError::ConfigError(format!("Logging already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_directives() {
        assert!(env_filter("attpcore=debug,info").is_ok());
    }

    #[test]
    fn test_init_twice_is_error_not_panic() {
        // The first call may already fail if another test won the race
        let _ = init("info");
        assert!(init("info").is_err());
    }
}
