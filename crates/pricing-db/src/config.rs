//! Pricing engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                          | Default       |
//! |-----------------------------------|---------------|
//! | `PRICING_DB_PATH`                 | `pricing.db`  |
//! | `PRICING_DB_MAX_CONNECTIONS`      | `5`           |
//! | `PRICING_DB_CONNECT_TIMEOUT_SECS` | `30`          |
//! | `PRICING_DB_RUN_MIGRATIONS`       | `true`        |

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::pool::DbConfig;

/// Pricing engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// SQLite database file, or `:memory:`.
    pub database_path: String,

    /// Pool size.
    pub max_connections: u32,

    /// Connection acquire timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Apply pending migrations on startup.
    pub run_migrations: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            database_path: "pricing.db".to_string(),
            max_connections: 5,
            connect_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

impl PricingConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PricingConfig::default();

        let config = PricingConfig {
            database_path: lookup("PRICING_DB_PATH").unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "PRICING_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            connect_timeout_secs: parse_or(
                &lookup,
                "PRICING_DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,

            run_migrations: parse_or(&lookup, "PRICING_DB_RUN_MIGRATIONS", defaults.run_migrations)?,
        };

        if config.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("PRICING_DB_PATH".to_string()));
        }

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "PRICING_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        if self.database_path == ":memory:" {
            return DbConfig::in_memory().run_migrations(self.run_migrations);
        }

        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .run_migrations(self.run_migrations)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PricingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PricingConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = PricingConfig::from_lookup(lookup(&[
            ("PRICING_DB_PATH", "/data/prices.db"),
            ("PRICING_DB_MAX_CONNECTIONS", "8"),
            ("PRICING_DB_RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, "/data/prices.db");
        assert_eq!(config.max_connections, 8);
        assert!(!config.run_migrations);

        let db = config.db_config();
        assert_eq!(db.max_connections, 8);
        assert!(!db.run_migrations);
    }

    #[test]
    fn test_invalid_values() {
        let err = PricingConfig::from_lookup(lookup(&[("PRICING_DB_MAX_CONNECTIONS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "PRICING_DB_MAX_CONNECTIONS"));

        let err = PricingConfig::from_lookup(lookup(&[("PRICING_DB_MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = PricingConfig::from_lookup(lookup(&[("PRICING_DB_PATH", " ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_memory_path_uses_single_connection() {
        let config = PricingConfig::from_lookup(lookup(&[("PRICING_DB_PATH", ":memory:")])).unwrap();
        let db = config.db_config();
        assert!(db.is_in_memory());
        assert_eq!(db.max_connections, 1);
    }
}
