//! Service configuration from environment variables

use crate::ingest::archive::DEFAULT_MAX_MEMBER_BYTES;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DB_PATH: &str = "data/prices.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STAGING_DIR: &str = "./temp";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Configuration for the price server
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to SQLite database file
    pub db_path: PathBuf,

    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Directory uploads are staged in before extraction
    pub staging_dir: PathBuf,

    /// Largest accepted request body
    pub max_upload_bytes: usize,

    /// Largest decompressed size of one CSV member
    pub max_member_bytes: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_member_bytes: DEFAULT_MAX_MEMBER_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PRICEFLOW_DB_PATH` (default: data/prices.db)
    /// - `PRICEFLOW_BIND_ADDR` (default: 0.0.0.0:8080)
    /// - `PRICEFLOW_STAGING_DIR` (default: ./temp)
    /// - `PRICEFLOW_MAX_UPLOAD_BYTES` (default: 33554432)
    /// - `PRICEFLOW_MAX_MEMBER_BYTES` (default: 268435456)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_upload_bytes = size_var("PRICEFLOW_MAX_UPLOAD_BYTES", defaults.max_upload_bytes);
        let max_member_bytes = size_var("PRICEFLOW_MAX_MEMBER_BYTES", defaults.max_member_bytes);

        Self {
            db_path: env::var("PRICEFLOW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            bind_addr: env::var("PRICEFLOW_BIND_ADDR").unwrap_or(defaults.bind_addr),

            staging_dir: env::var("PRICEFLOW_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),

            max_upload_bytes,
            max_member_bytes,
        }
    }
}

/// Read a byte count; unset or unparseable values fall back to `default`
fn size_var<T: FromStr + Display + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', defaulting to {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
