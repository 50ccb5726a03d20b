//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use chrono::{FixedOffset, NaiveTime};
use std::net::SocketAddr;
use tracing::Level;
use tutors_core::booking::GridSettings;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where marketplace data lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local storage; data is lost on restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub cors_origin: HeaderValue,
    pub grid: GridSettings,
    pub schedule_offset: FixedOffset,
    pub realtime_capacity: usize,
    /// Seeds a development user and session when running on memory storage.
    pub dev_session_token: Option<String>,
}

fn invalid(var: &str, detail: impl ToString) -> ConfigError {
    ConfigError::InvalidValue(var.to_string(), detail.to_string())
}

fn parse_time(var: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| invalid(var, format!("'{}' is not HH:MM ({})", value, e)))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDRESS", e))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            invalid(
                "RUST_LOG",
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin_str = var_or("CORS_ORIGIN", "http://localhost:3000");
        let cors_origin =
            HeaderValue::from_str(&cors_origin_str).map_err(|e| invalid("CORS_ORIGIN", e))?;

        // --- Storage ---
        let storage = match var_or("STORAGE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(invalid(
                    "STORAGE_BACKEND",
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };
        let database_max_connections = var_or("DATABASE_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .map_err(|e| invalid("DATABASE_MAX_CONNECTIONS", e))?;

        // --- Schedule ---
        let day_start = parse_time("SCHEDULE_DAY_START", &var_or("SCHEDULE_DAY_START", "08:00"))?;
        let day_end = parse_time("SCHEDULE_DAY_END", &var_or("SCHEDULE_DAY_END", "22:00"))?;
        let slot_minutes = var_or("SCHEDULE_SLOT_MINUTES", "60")
            .parse::<u32>()
            .map_err(|e| invalid("SCHEDULE_SLOT_MINUTES", e))?;
        if day_start >= day_end {
            return Err(invalid(
                "SCHEDULE_DAY_END",
                format!("{} is not after SCHEDULE_DAY_START {}", day_end, day_start),
            ));
        }
        let grid = GridSettings::new(day_start, day_end, slot_minutes)
            .map_err(|e| invalid("SCHEDULE_SLOT_MINUTES", e))?;

        let offset_minutes = var_or("SCHEDULE_UTC_OFFSET_MINUTES", "330")
            .parse::<i32>()
            .map_err(|e| invalid("SCHEDULE_UTC_OFFSET_MINUTES", e))?;
        let schedule_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| invalid("SCHEDULE_UTC_OFFSET_MINUTES", "offset out of range"))?;

        // --- Realtime ---
        let realtime_capacity = var_or("REALTIME_CAPACITY", "256")
            .parse::<usize>()
            .map_err(|e| invalid("REALTIME_CAPACITY", e))?;

        let dev_session_token = lookup("DEV_SESSION_TOKEN").filter(|t| !t.is_empty());

        Ok(Self {
            bind_address,
            storage,
            database_max_connections,
            log_level,
            cors_origin,
            grid,
            schedule_offset,
            realtime_capacity,
            dev_session_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_with_a_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/tutors")]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(
            config.storage,
            StorageBackend::Postgres {
                database_url: "postgres://localhost/tutors".to_string()
            }
        );
        assert_eq!(config.grid.slot_starts().len(), 14);
        assert_eq!(config.schedule_offset.local_minus_utc(), 330 * 60);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn postgres_requires_a_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(var)) if var == "DATABASE_URL"));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let config = load(&[("STORAGE_BACKEND", "memory"), ("SCHEDULE_SLOT_MINUTES", "30")]).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.grid.slot_starts().len(), 28);
    }

    #[rstest]
    #[case("BIND_ADDRESS", "not-an-address")]
    #[case("RUST_LOG", "chatty")]
    #[case("STORAGE_BACKEND", "sqlite")]
    #[case("SCHEDULE_DAY_START", "8am")]
    #[case("SCHEDULE_DAY_END", "07:00")]
    #[case("SCHEDULE_SLOT_MINUTES", "45")]
    #[case("SCHEDULE_SLOT_MINUTES", "0")]
    #[case("SCHEDULE_UTC_OFFSET_MINUTES", "100000")]
    fn invalid_values_name_the_variable(#[case] var: &str, #[case] value: &str) {
        let result = load(&[("STORAGE_BACKEND", "memory"), (var, value)]);
        assert!(matches!(result, Err(ConfigError::InvalidValue(name, _)) if name == var));
    }
}
