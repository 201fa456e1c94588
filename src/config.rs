use crate::catalog::CatalogConfig;
use crate::error::{AppError, Result};

pub const DEFAULT_DB_PATH: &str = "catalog.db";

/// SQLite serialises writers anyway; one connection keeps every request's
/// read-then-write cascade strictly ordered.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 1;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    /// Pool size (DB_MAX_CONNECTIONS)
    pub db_max_connections: u32,
    pub api_port: u16,
    /// Reject renames whose slug collides with another row (SLUG_UNIQUE_ON_UPDATE).
    /// Off by default: the collision is logged and allowed.
    pub slug_unique_on_update: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        check_env_file(dotenvy::dotenv())?;

        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DB_MAX_CONNECTIONS.to_string())
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config("DB_MAX_CONNECTIONS must be a positive integer".to_string())
                })?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            slug_unique_on_update: match std::env::var("SLUG_UNIQUE_ON_UPDATE") {
                Ok(v) => crate::filter::parse_bool(&v).ok_or_else(|| {
                    AppError::Config(format!("SLUG_UNIQUE_ON_UPDATE must be a boolean, got \"{v}\""))
                })?,
                Err(_) => false,
            },
        })
    }

    pub fn catalog(&self) -> CatalogConfig {
        CatalogConfig {
            unique_slug_on_update: self.slug_unique_on_update,
        }
    }
}

/// A missing `.env` is fine; one that exists but cannot be read or parsed is not.
fn check_env_file<T>(loaded: dotenvy::Result<T>) -> Result<()> {
    match loaded {
        Err(e) if !e.not_found() => Err(AppError::Config(format!("failed to load .env: {e}"))),
        _ => Ok(()),
    }
}
