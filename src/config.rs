use crate::errors::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Per-request timeout for every upstream call.
    pub fetch_timeout: Duration,
    /// Minimum interval between successive calls to the same venue.
    pub min_call_interval: Duration,
    pub api_port: u16,
    /// How often serve mode re-runs the aggregation.
    pub refresh_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            fetch_timeout: Duration::from_secs(env_or("FETCH_TIMEOUT_SECS", 5u64)?),
            min_call_interval: Duration::from_millis(env_or("MIN_CALL_INTERVAL_MS", 250u64)?),
            api_port: env_or("API_PORT", 3000u16)?,
            refresh_interval: Duration::from_secs(env_or("REFRESH_SECS", 60u64)?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            min_call_interval: Duration::from_millis(250),
            api_port: 3000,
            refresh_interval: Duration::from_secs(60),
        }
    }
}

fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnv {
            var,
            value: raw.trim().to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default() {
        assert_eq!(env_or("FUNDARB_TEST_UNSET_VAR", 42u64).unwrap(), 42);
    }

    #[test]
    fn env_or_rejects_garbage() {
        // set_var is process-global; use a variable name no other test touches
        unsafe { env::set_var("FUNDARB_TEST_BAD_PORT", "not-a-port") };
        let err = env_or::<u16>("FUNDARB_TEST_BAD_PORT", 1).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { var: "FUNDARB_TEST_BAD_PORT", .. }
        ));
        unsafe { env::remove_var("FUNDARB_TEST_BAD_PORT") };
    }
}
