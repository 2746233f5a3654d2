//! Config
//! Settings read from the environment, once, at startup.

use crate::selection::Completeness;
use std::env;

/// Completeness to use when an address doesn't give one.
pub const COMPLETENESS_KEY: &str = "MEI_ADDRESS_COMPLETENESS";

/// Standard tracing filter directive, e.g. "debug" or "mei_address=debug".
pub const LOG_KEY: &str = "RUST_LOG";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, PartialEq, Clone)]
pub struct Config {
    pub default_completeness: Completeness,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Bad values are reported and replaced with defaults.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_completeness = match lookup(COMPLETENESS_KEY) {
            Some(value) => match value.parse::<Completeness>() {
                Ok(completeness) => completeness,
                Err(err) => {
                    eprintln!(
                        "Ignoring {}: {}. Using default of {}.",
                        COMPLETENESS_KEY,
                        err,
                        Completeness::default()
                    );
                    Completeness::default()
                }
            },
            None => Completeness::default(),
        };

        let log_filter = lookup(LOG_KEY).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Config {
            default_completeness,
            log_filter,
        }
    }
}
