//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local use.

use std::env;
use std::path::PathBuf;

use crate::services::device_id::local_device_id;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the cloud service, always ending in `/`
    pub base_url: String,
    /// Identifier sent when requesting a pairing token
    pub device_id: String,
    /// Path of the local SQLite store
    pub database_path: PathBuf,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let base_url = env::var("TRAIL_SYNC_BASE_URL")
            .map_err(|_| ConfigError::Missing("TRAIL_SYNC_BASE_URL"))?;

        let request_timeout_secs = match env::var("TRAIL_SYNC_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("TRAIL_SYNC_TIMEOUT_SECS", v))?,
            Err(_) => 30,
        };

        Ok(Self {
            base_url: normalize_base_url(base_url.trim()),
            device_id: env::var("TRAIL_SYNC_DEVICE_ID")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| local_device_id()),
            database_path: env::var("TRAIL_SYNC_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("trail-sync.db")),
            request_timeout_secs,
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            device_id: "test-device".to_string(),
            database_path: PathBuf::from(":memory:"),
            request_timeout_secs: 5,
        }
    }
}

/// Ensure the base URL ends with a slash so endpoint paths can be appended.
pub fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
