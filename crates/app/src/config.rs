use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheTtls;
use crate::service::Timeouts;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub redis_url: Option<String>,
    pub cache_namespace: String,
    pub store_timeout: Duration,
    pub cache_timeout: Duration,
    pub background_timeout: Duration,
    pub listing_ttl: Duration,
    pub subtree_ttl: Duration,
    pub entry_ttl: Duration,
    pub cache_sweep_interval: Duration,
    pub shutdown_drain: Duration,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys take their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let http_addr_raw = env.string("ARBOR_HTTP_ADDR", "127.0.0.1:8080");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let db_max_connections = env.u64("ARBOR_DB_MAX_CONNECTIONS", 5)?;
        let db_max_connections = u32::try_from(db_max_connections)
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue("ARBOR_DB_MAX_CONNECTIONS", db_max_connections.to_string())
            })?;
        let cache_namespace = env.string("ARBOR_CACHE_NAMESPACE", "arbor");
        if cache_namespace.trim().is_empty() {
            return Err(ConfigError::InvalidValue("ARBOR_CACHE_NAMESPACE", cache_namespace));
        }
        let cache_sweep_interval = env.secs("ARBOR_CACHE_SWEEP_INTERVAL_SECS", 60)?;
        if cache_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "ARBOR_CACHE_SWEEP_INTERVAL_SECS",
                "0".to_string(),
            ));
        }

        Ok(Self {
            http_addr,
            database_url: env.optional("ARBOR_DATABASE_URL"),
            db_max_connections,
            redis_url: env.optional("ARBOR_REDIS_URL"),
            cache_namespace: cache_namespace.trim().to_string(),
            store_timeout: env.millis("ARBOR_STORE_TIMEOUT_MS", 3000)?,
            cache_timeout: env.millis("ARBOR_CACHE_TIMEOUT_MS", 250)?,
            background_timeout: env.millis("ARBOR_BACKGROUND_TIMEOUT_MS", 2000)?,
            listing_ttl: env.secs("ARBOR_LISTING_TTL_SECS", 60)?,
            subtree_ttl: env.secs("ARBOR_SUBTREE_TTL_SECS", 300)?,
            entry_ttl: env.secs("ARBOR_ENTRY_TTL_SECS", 300)?,
            cache_sweep_interval,
            shutdown_drain: env.secs("ARBOR_SHUTDOWN_DRAIN_SECS", 5)?,
            cors_allow_origins: env.list("ARBOR_CORS_ALLOW_ORIGINS"),
        })
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            store: self.store_timeout,
            background: self.background_timeout,
        }
    }

    pub fn cache_ttls(&self) -> CacheTtls {
        CacheTtls {
            listing: self.listing_ttl,
            subtree: self.subtree_ttl,
            entry: self.entry_ttl,
        }
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &'static str, default: &'static str) -> String {
        (self.lookup)(key).unwrap_or_else(|| default.to_string())
    }

    fn optional(&self, key: &'static str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn u64(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        match (self.lookup)(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber(key, raw)),
        }
    }

    fn secs(&self, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
        self.u64(key, default).map(Duration::from_secs)
    }

    fn millis(&self, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
        self.u64(key, default).map(Duration::from_millis)
    }

    fn list(&self, key: &'static str) -> Vec<String> {
        (self.lookup)(key)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.http_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url, None);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.cache_namespace, "arbor");
        assert_eq!(config.store_timeout, Duration::from_millis(3000));
        assert_eq!(config.cache_timeout, Duration::from_millis(250));
        assert_eq!(config.background_timeout, Duration::from_millis(2000));
        assert_eq!(config.listing_ttl, Duration::from_secs(60));
        assert_eq!(config.subtree_ttl, Duration::from_secs(300));
        assert!(config.cors_allow_origins.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("ARBOR_HTTP_ADDR", "0.0.0.0:9000"),
            ("ARBOR_DATABASE_URL", " postgres://localhost/arbor "),
            ("ARBOR_LISTING_TTL_SECS", "15"),
            ("ARBOR_CORS_ALLOW_ORIGINS", "https://a.example, ,https://b.example"),
        ])
        .unwrap();
        assert_eq!(config.http_addr.port(), 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/arbor"));
        assert_eq!(config.listing_ttl, Duration::from_secs(15));
        assert_eq!(
            config.cors_allow_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            config(&[("ARBOR_HTTP_ADDR", "nowhere")]),
            Err(ConfigError::InvalidSocket(_))
        ));
        assert!(matches!(
            config(&[("ARBOR_STORE_TIMEOUT_MS", "soon")]),
            Err(ConfigError::InvalidNumber("ARBOR_STORE_TIMEOUT_MS", _))
        ));
        assert!(matches!(
            config(&[("ARBOR_DB_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidValue("ARBOR_DB_MAX_CONNECTIONS", _))
        ));
        assert!(matches!(
            config(&[("ARBOR_CACHE_SWEEP_INTERVAL_SECS", "0")]),
            Err(ConfigError::InvalidValue(..))
        ));
    }
}
