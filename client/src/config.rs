use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_BASE_URL: &str = "CHATSYNC_BASE_URL";
const ENV_POLL_SECS: &str = "CHATSYNC_POLL_SECS";
const ENV_TIMEOUT_SECS: &str = "CHATSYNC_TIMEOUT_SECS";
const ENV_TOKEN_PATH: &str = "CHATSYNC_TOKEN_PATH";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings for a [`ChatClient`](crate::ChatClient)
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Server root, e.g. `http://127.0.0.1:5000`
    pub base_url: String,
    /// Period between message fetches for the active chatroom
    pub poll_interval: Duration,
    /// Transport timeout applied to every request
    pub request_timeout: Duration,
    /// Where tokens are persisted; `None` uses the platform data directory
    pub token_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token_path: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CHATSYNC_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(value) = lookup(ENV_POLL_SECS) {
            config.poll_interval = parse_secs(ENV_POLL_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout = parse_secs(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Some(path) = lookup(ENV_TOKEN_PATH).filter(|v| !v.trim().is_empty()) {
            config.token_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval",
                value: format!("{:?}", self.poll_interval),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout",
                value: format!("{:?}", self.request_timeout),
            });
        }
        Ok(())
    }

    /// Resolved token file location
    pub fn token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("chatsync").join("tokens.json"))
                .unwrap_or_else(|| PathBuf::from(".chatsync-tokens.json"))
        })
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .filter(|duration| !duration.is_zero())
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.token_path, None);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://chat.example.com "),
            (ENV_POLL_SECS, "0.5"),
            (ENV_TIMEOUT_SECS, "3"),
            (ENV_TOKEN_PATH, "/tmp/tokens.json"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://chat.example.com");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.token_path(), PathBuf::from("/tmp/tokens.json"));
    }

    #[test]
    fn test_rejects_bad_interval() {
        let result = ClientConfig::from_lookup(lookup(&[(ENV_POLL_SECS, "0")]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                key: ENV_POLL_SECS,
                value: "0".to_string()
            })
        );
        assert!(ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        assert_eq!(ClientConfig::default().validate(), Ok(()));

        let config = ClientConfig {
            poll_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "poll_interval", .. })
        ));

        let config = ClientConfig {
            request_timeout: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_interval() {
        for value in ["1e30", "-1", "inf", "NaN", "1e-30"] {
            let result = ClientConfig::from_lookup(lookup(&[(ENV_POLL_SECS, value)]));

            assert_eq!(
                result,
                Err(ConfigError::InvalidValue {
                    key: ENV_POLL_SECS,
                    value: value.to_string()
                }),
                "{value}"
            );
        }
    }
}
