// src/config.rs
use log::warn;
use std::env;
use std::time::Duration;

pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw";
pub const DEFAULT_PROFILE_URL: &str = "https://bullaware.com/etoro";

/// Bounds of one profile fetch sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempt_timeout: Duration,
    pub backoff: Duration,
    /// Retries after the first attempt; timeout-class failures only.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempt_timeout: Duration::from_secs(10),
            backoff: Duration::from_millis(1500),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: String,
    pub relay_url: String,
    pub profile_url: String,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Reads PORT, DATA_DIR, RELAY_URL and PROFILE_URL, falling back to defaults.
    pub fn from_env() -> Self {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("PORT={} is not a number, defaulting to 3030", raw);
                3030
            }),
            Err(_) => {
                warn!("$PORT not set, defaulting to 3030");
                3030
            }
        };

        AppConfig {
            port,
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./state".to_string()),
            relay_url: env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            profile_url: env::var("PROFILE_URL").unwrap_or_else(|_| DEFAULT_PROFILE_URL.to_string()),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy_matches_fetch_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempt_timeout, Duration::from_secs(10));
        assert_eq!(policy.backoff, Duration::from_millis(1500));
        assert_eq!(policy.max_retries, 2);
    }
}
