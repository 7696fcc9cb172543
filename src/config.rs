use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Which backend answers proximity queries and driver updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Remote,
    Sqlite,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "remote" | "http" => Ok(SourceKind::Remote),
            "sqlite" | "store" | "db" => Ok(SourceKind::Sqlite),
            other => Err(format!("unknown location source {other:?}, expected remote or sqlite")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub grpc_port: u16,
    pub log_level: String,
    pub location_source: SourceKind,
    pub backend_url: String,
    pub backend_timeout_ms: u64,
    pub database_path: String,
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8083,
            grpc_port: 50053,
            log_level: "info".to_string(),
            location_source: SourceKind::Remote,
            backend_url: "http://driver-service:8083/api/driver-service".to_string(),
            backend_timeout_ms: 10_000,
            database_path: "drivers.db".to_string(),
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            grpc_port: parse_or_default("GRPC_PORT", defaults.grpc_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            location_source: parse_or_default("LOCATION_SOURCE", defaults.location_source)?,
            backend_url: env::var("BACKEND_URL").unwrap_or(defaults.backend_url),
            backend_timeout_ms: parse_or_default("BACKEND_TIMEOUT_MS", defaults.backend_timeout_ms)?,
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            default_limit: parse_or_default("DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: parse_or_default("MAX_LIMIT", defaults.max_limit)?,
        };

        if config.default_limit == 0 || config.max_limit == 0 {
            return Err(AppError::Internal(
                "DEFAULT_LIMIT and MAX_LIMIT must be > 0".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
