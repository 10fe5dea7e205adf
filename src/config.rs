//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::db::pool::PoolSettings;
use crate::error::AppError;

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite database file (`DATABASE_PATH`).
    pub database_path: PathBuf,
    /// TCP port the HTTP server binds on all interfaces (`SERVER_PORT`).
    pub server_port: u16,
    /// Upper bound of pooled connections (`DB_MAX_CONNECTIONS`).
    pub db_max_connections: u32,
    /// How long a writer waits for the SQLite lock (`DB_BUSY_TIMEOUT_SECS`).
    pub db_busy_timeout: Duration,
    /// Grace period for in-flight requests on shutdown (`SHUTDOWN_TIMEOUT_SECS`).
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("pr-reviewers.db"),
            server_port: 8080,
            db_max_connections: 5,
            db_busy_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl AppConfig {
    /// Load from the process environment, falling back to defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_path = lookup("DATABASE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        Ok(Self {
            database_path,
            server_port: parse_var(&lookup, "SERVER_PORT", defaults.server_port)?,
            db_max_connections: parse_var(
                &lookup,
                "DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            db_busy_timeout: Duration::from_secs(parse_var(
                &lookup,
                "DB_BUSY_TIMEOUT_SECS",
                defaults.db_busy_timeout.as_secs(),
            )?),
            shutdown_timeout: Duration::from_secs(parse_var(
                &lookup,
                "SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout.as_secs(),
            )?),
        })
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.db_max_connections,
            busy_timeout: self.db_busy_timeout,
            ..PoolSettings::default()
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("{} has invalid value {:?}: {}", key, raw, e))),
        _ => Ok(default),
    }
}
