//! Runtime configuration from environment variables.
//!
//! | Variable            | Default   | Meaning                                   |
//! |---------------------|-----------|-------------------------------------------|
//! | `PORT`              | 8080      | HTTP listen port                          |
//! | `STORE_PATH`        | (unset)   | JSON file store; in-memory when unset     |
//! | `COMMIT_TIMEOUT_MS` | 2000      | Deadline for one commit                   |
//! | `QUEUE_CAPACITY`    | 1024      | Bound of the intake and intent queues     |
//!
//! Log level comes from `RUST_LOG` (env_logger).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub store_path: Option<PathBuf>,
    pub commit_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            store_path: None,
            commit_timeout: Duration::from_millis(2000),
            queue_capacity: 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys take defaults; set but
    /// unparsable keys are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let commit_timeout_ms = parse(&lookup, "COMMIT_TIMEOUT_MS")?;
        let queue_capacity = parse(&lookup, "QUEUE_CAPACITY")?.unwrap_or(defaults.queue_capacity);
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUEUE_CAPACITY",
                value: "0".into(),
            });
        }
        Ok(Self {
            port: parse(&lookup, "PORT")?.unwrap_or(defaults.port),
            store_path: lookup("STORE_PATH").filter(|s| !s.is_empty()).map(PathBuf::from),
            commit_timeout: commit_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.commit_timeout),
            queue_capacity,
        })
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn reads_all_keys() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("STORE_PATH", "/tmp/dealer.json"),
            ("COMMIT_TIMEOUT_MS", "250"),
            ("QUEUE_CAPACITY", "16"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/dealer.json")));
        assert_eq!(config.commit_timeout, Duration::from_millis(250));
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(Config::from_lookup(lookup(&[("QUEUE_CAPACITY", "0")])).is_err());
    }
}
