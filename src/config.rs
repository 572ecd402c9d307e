use thiserror::Error;

use std::time::Duration;

pub const MAX_RETRIES_VAR: &str = "PADDING_ORACLE_MAX_RETRIES";
pub const RETRY_BACKOFF_MS_VAR: &str = "PADDING_ORACLE_RETRY_BACKOFF_MS";
pub const PARALLEL_VAR: &str = "PADDING_ORACLE_PARALLEL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value '{value}' for {variable}")]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

/// Tuning for a padding oracle attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackConfig {
    /// How many times a failed oracle query is retried before giving up.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub retry_backoff: Duration,
    /// Recover blocks, and scan guesses, on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_millis(50),
            parallel: false,
        }
    }
}

impl AttackConfig {
    /// Defaults, overridden by any of the `PADDING_ORACLE_*` environment
    /// variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(MAX_RETRIES_VAR) {
            config.max_retries = parse_var(MAX_RETRIES_VAR, value)?;
        }
        if let Some(value) = lookup(RETRY_BACKOFF_MS_VAR) {
            config.retry_backoff = Duration::from_millis(parse_var(RETRY_BACKOFF_MS_VAR, value)?);
        }
        if let Some(value) = lookup(PARALLEL_VAR) {
            config.parallel = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError {
                        variable: PARALLEL_VAR,
                        value,
                    })
                }
            };
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(variable: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError { variable, value })
}
