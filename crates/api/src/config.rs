//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// How often the dispatcher polls when no event wakes it.
    pub poll_interval: Duration,
    /// Shared secret required by the event webhook. Unset disables the webhook.
    pub event_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TAPFLOW_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:tapflow.db?mode=rwc` |
    /// | `TAPFLOW_POLL_INTERVAL_MS` | Dispatcher poll interval | `1000` |
    /// | `TAPFLOW_EVENT_KEY` | Event webhook secret | none |
    ///
    /// The language model is configured separately through `ANTHROPIC_*`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("TAPFLOW_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:tapflow.db?mode=rwc".to_string());

        let poll_ms = match env::var("TAPFLOW_POLL_INTERVAL_MS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidPollInterval(value))?,
            Err(_) => 1000,
        };

        let event_key = env::var("TAPFLOW_EVENT_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            addr,
            database_url,
            poll_interval: Duration::from_millis(poll_ms),
            event_key,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TAPFLOW_ADDR format")]
    InvalidAddr,

    #[error("Invalid TAPFLOW_POLL_INTERVAL_MS: {0}")]
    InvalidPollInterval(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests mutate the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear() {
        env::remove_var("TAPFLOW_ADDR");
        env::remove_var("SQLITE_PATH");
        env::remove_var("TAPFLOW_POLL_INTERVAL_MS");
        env::remove_var("TAPFLOW_EVENT_KEY");
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear();

        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8790");
        assert_eq!(config.database_url, "sqlite:tapflow.db?mode=rwc");
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert!(config.event_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear();
        env::set_var("TAPFLOW_ADDR", "0.0.0.0:9000");
        env::set_var("SQLITE_PATH", "sqlite::memory:");
        env::set_var("TAPFLOW_POLL_INTERVAL_MS", "250");
        env::set_var("TAPFLOW_EVENT_KEY", " s3cret ");

        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.event_key.as_deref(), Some("s3cret"));
        clear();
    }

    #[test]
    fn test_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear();

        env::set_var("TAPFLOW_ADDR", "not-an-addr");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));
        env::remove_var("TAPFLOW_ADDR");

        env::set_var("TAPFLOW_POLL_INTERVAL_MS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidPollInterval(_))
        ));
        clear();
    }
}
