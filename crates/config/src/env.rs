use athena_common::error::{AthenaError, AthenaResult};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub blob_root: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads required vars.
    pub fn from_env() -> AthenaResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_var("DATABASE_URL")?,
            blob_root: get_var_or("BLOB_ROOT", "./blobs"),
            host: get_var_or("HOST", "0.0.0.0"),
            port: get_var_or("PORT", "8080")
                .parse()
                .map_err(|e| AthenaError::Config(format!("invalid PORT: {e}")))?,
            log_level: get_var_or("LOG_LEVEL", "info"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn get_var(key: &str) -> AthenaResult<String> {
    env::var(key).map_err(|_| AthenaError::Config(format!("{key} is required but not set")))
}

/// Read an optional variable, falling back to `default` when unset.
pub fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
