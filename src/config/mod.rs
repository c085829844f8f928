//! Configuration module for the review backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Default number of questions per review-queue page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a search may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Review-queue page size
    pub page_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("REVIEW_API_PSK").ok();

        let db_path = env::var("REVIEW_DB_PATH")
            .unwrap_or_else(|_| "./data/review.sqlite".to_string())
            .into();

        let index_path = env::var("REVIEW_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("REVIEW_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid REVIEW_BIND_ADDR: {}", e)))?;

        let log_level = env::var("REVIEW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let page_size = match env::var("REVIEW_PAGE_SIZE") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "Invalid REVIEW_PAGE_SIZE {:?}: expected 1..={}",
                        raw, MAX_PAGE_SIZE
                    ))
                })?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("REVIEW_API_PSK");
        env::remove_var("REVIEW_DB_PATH");
        env::remove_var("REVIEW_INDEX_PATH");
        env::remove_var("REVIEW_BIND_ADDR");
        env::remove_var("REVIEW_LOG_LEVEL");
        env::remove_var("REVIEW_PAGE_SIZE");

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/review.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }
}
