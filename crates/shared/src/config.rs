use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ibge::DEFAULT_API_URL;
use crate::store::DEFAULT_DATA_FILE;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_file: PathBuf,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Every setting is optional; unset variables keep the defaults.
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("NEWS_SHELF_API_URL") {
            config.api_url = url;
        }

        if let Some(path) = lookup("NEWS_SHELF_DATA_FILE") {
            config.data_file = PathBuf::from(path);
        }

        if let Some(secs) = lookup("NEWS_SHELF_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().with_context(|| {
                format!(
                    "NEWS_SHELF_TIMEOUT_SECS must be a whole number of seconds, got \"{}\"",
                    secs
                )
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/news-shelf/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("news-shelf").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, that's okay - the defaults work without any configuration
    }
}
