use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::info;

use crate::error::ConfigError;
use crate::ledger::DEFAULT_PREFIX;

const DEFAULT_API_BASE: &str =
    "https://mohsin-pollz-function-ebf4fad7ame7hhcj.northeurope-01.azurewebsites.net/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub database_url: String,
    pub storage_prefix: String,
    pub http_timeout: Duration,
    pub refresh_interval: Duration,
}

impl Config {
    /// Reads the environment (after `.env`, if the caller loaded it).
    pub fn load() -> Result<Self, ConfigError> {
        let timeout_secs = try_load("POLLZ_HTTP_TIMEOUT_SECS", "10")?;
        let refresh_secs = try_load("POLLZ_REFRESH_SECS", "30")?;
        Ok(Self {
            api_base: try_load("POLLZ_API_BASE", DEFAULT_API_BASE)?,
            database_url: try_load("DATABASE_URL", "sqlite:pollz.db")?,
            storage_prefix: try_load("POLLZ_STORAGE_PREFIX", DEFAULT_PREFIX)?,
            http_timeout: positive_secs("POLLZ_HTTP_TIMEOUT_SECS", timeout_secs)?,
            refresh_interval: positive_secs("POLLZ_REFRESH_SECS", refresh_secs)?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

// Intervals and timeouts of zero seconds are never what anyone meant
fn positive_secs(key: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let secs: u64 = try_load("POLLZ_TEST_SURELY_UNSET", "7").unwrap();
        assert_eq!(secs, 7);
    }

    #[test]
    fn unparsable_values_are_errors() {
        let err = try_load::<u64>("POLLZ_TEST_SURELY_UNSET_TOO", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_seconds_are_rejected() {
        let err = positive_secs("POLLZ_REFRESH_SECS", 0).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "POLLZ_REFRESH_SECS"));
        assert_eq!(positive_secs("POLLZ_REFRESH_SECS", 30).unwrap(), Duration::from_secs(30));
    }
}
