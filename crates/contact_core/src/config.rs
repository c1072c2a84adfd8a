//! Runtime configuration for the contact core.
//!
//! # Responsibility
//! - Provide defaults that work without any setup.
//! - Allow overrides through `CONTACTS_*` environment variables.
//!
//! # Invariants
//! - Empty or unparsable overrides fall back to defaults.
//! - `batch_size` is never zero.

use log::warn;
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "CONTACTS_DB_PATH";
pub const SOURCE_URL_ENV: &str = "CONTACTS_SOURCE_URL";
pub const BATCH_SIZE_ENV: &str = "CONTACTS_BATCH_SIZE";
pub const FETCH_TIMEOUT_ENV: &str = "CONTACTS_FETCH_TIMEOUT_SECS";

const DEFAULT_DB_FILE_NAME: &str = "contacts_core.sqlite3";
const DEFAULT_SOURCE_URL: &str = "https://randomuser.me/api/";
const DEFAULT_BATCH_SIZE: u32 = 50;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsConfig {
    /// SQLite file holding the key-value entries.
    pub db_path: PathBuf,
    /// Remote contact endpoint.
    pub source_url: String,
    /// Records requested by the first-run fetch.
    pub batch_size: u32,
    /// Upper bound for one remote request.
    pub request_timeout: Duration,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ContactsConfig {
    /// Builds a config from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            source_url: read(SOURCE_URL_ENV).unwrap_or(defaults.source_url),
            batch_size: read(BATCH_SIZE_ENV)
                .and_then(|value| parse_positive(BATCH_SIZE_ENV, &value))
                .unwrap_or(defaults.batch_size),
            request_timeout: read(FETCH_TIMEOUT_ENV)
                .and_then(|value| parse_positive(FETCH_TIMEOUT_ENV, &value))
                .map_or(defaults.request_timeout, |secs| {
                    Duration::from_secs(u64::from(secs))
                }),
        }
    }
}

fn parse_positive(key: &str, value: &str) -> Option<u32> {
    match value.parse::<u32>() {
        Ok(0) | Err(_) => {
            warn!("event=config_override module=config status=skip key={key} reason=invalid");
            None
        }
        Ok(parsed) => Some(parsed),
    }
}
