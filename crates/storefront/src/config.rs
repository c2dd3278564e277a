//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (postgres store)
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_STORE` - Storage backend, `postgres` or `memory` (default: postgres)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: &str = "10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where catalog and cart data is kept.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// `PostgreSQL` via a connection pool.
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
        /// Upper bound on pooled connections
        max_connections: u32,
    },
    /// Process memory; contents are lost on restart.
    Memory,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when unset
    pub dsn: Option<String>,
    /// Environment tag (e.g. production, staging)
    pub environment: Option<String>,
    /// Fraction of error events sent
    pub sample_rate: f32,
    /// Fraction of transactions traced
    pub traces_sample_rate: f32,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Storage backend
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Sentry configuration
    pub sentry: SentryConfig,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let store = match env.or_default("STOREFRONT_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: env.database_url("STOREFRONT_DATABASE_URL")?,
                max_connections: env
                    .parsed("STOREFRONT_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STOREFRONT_STORE".to_string(),
                    format!("unknown store '{other}' (expected postgres or memory)"),
                ));
            }
        };

        Ok(Self {
            store,
            host: env.parsed("STOREFRONT_HOST", "127.0.0.1")?,
            port: env.parsed("STOREFRONT_PORT", "3000")?,
            sentry: SentryConfig {
                dsn: env.optional("SENTRY_DSN"),
                environment: env.optional("SENTRY_ENVIRONMENT"),
                sample_rate: env.rate("SENTRY_SAMPLE_RATE", "1.0")?,
                traces_sample_rate: env.rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, using `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a sampling rate in `[0.0, 1.0]`.
    fn rate(&self, key: &str, default: &str) -> Result<f32, ConfigError> {
        let rate: f32 = self.parsed(key, default)?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("{rate} is outside 0.0..=1.0"),
            ));
        }
        Ok(rate)
    }

    /// Get database URL with fallback to generic `DATABASE_URL` (set by most
    /// managed Postgres attach flows).
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_memory_store_needs_no_database() {
        let config = load(&[("STOREFRONT_STORE", "memory")]).unwrap();
        assert!(matches!(config.store, StoreBackend::Memory));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.sentry.dsn.is_none());
        assert!((config.sentry.sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "STOREFRONT_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/kandahar")]).unwrap();
        match config.store {
            StoreBackend::Postgres {
                database_url,
                max_connections,
            } => {
                assert_eq!(database_url.expose_secret(), "postgres://localhost/kandahar");
                assert_eq!(max_connections, 10);
            }
            StoreBackend::Memory => panic!("expected postgres backend"),
        }
    }

    #[test]
    fn test_primary_database_url_wins() {
        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://primary/db"),
            ("DATABASE_URL", "postgres://fallback/db"),
        ])
        .unwrap();
        let StoreBackend::Postgres { database_url, .. } = config.store else {
            panic!("expected postgres backend");
        };
        assert_eq!(database_url.expose_secret(), "postgres://primary/db");
    }

    #[test]
    fn test_unknown_store_is_invalid() {
        let err = load(&[("STOREFRONT_STORE", "sqlite")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STOREFRONT_STORE", "memory"), ("STOREFRONT_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_sample_rate_range() {
        let err = load(&[("STOREFRONT_STORE", "memory"), ("SENTRY_SAMPLE_RATE", "1.5")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("STOREFRONT_DATABASE_URL", "postgres://user:hunter2@db/shop")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
