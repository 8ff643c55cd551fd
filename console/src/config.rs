//! Application configuration
//!
//! Central location for configuration constants and the bootstrap
//! document that tells the console where each domain's API lives.

use crate::error::{AppError, Result};
use crate::models::Domain;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ===== Ranking =====

/// Number of entries requested for each ranking list when none is given
pub const DEFAULT_RANKING_COUNT: u32 = 10;

/// Upper bound accepted for a ranking request.
/// The dashboard never shows more than this many cards per list.
pub const MAX_RANKING_COUNT: u32 = 100;

// ===== Refresh =====

/// Interval between silent background refreshes
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

// ===== Listing =====

/// Default page size for paginated listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default sort field for paginated listings
pub const DEFAULT_SORT_FIELD: &str = "name";

// ===== HTTP =====

/// Timeout applied to every API request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// User agent sent with API requests
pub const USER_AGENT: &str = concat!("deskconsole/", env!("CARGO_PKG_VERSION"));

// ===== Bootstrap =====

/// Directory holding the per-environment bootstrap documents
pub const CONFIG_ASSET_DIR: &str = "assets/config";

/// File name of the on-disk copy of the last successfully loaded document
pub const CONFIG_CACHE_FILE: &str = "config.cache.json";

/// Bootstrap document listing the base URL of every backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub app_name: String,
    pub credentials_api_base_url: String,
    pub weblinks_api_base_url: String,
    pub notes_api_base_url: String,
    #[serde(default)]
    pub managements_api_base_url: Option<String>,
    #[serde(default)]
    pub reports_api_base_url: Option<String>,
}

impl AppConfig {
    /// Base URL of the backend serving a domain
    pub fn base_url(&self, domain: Domain) -> &str {
        match domain {
            Domain::Credentials => &self.credentials_api_base_url,
            Domain::Links => &self.weblinks_api_base_url,
            Domain::Notes => &self.notes_api_base_url,
        }
    }

    /// Full collection URL of a domain, e.g. `https://host/api/notes`
    pub fn collection_url(&self, domain: Domain) -> String {
        format!(
            "{}/{}",
            self.base_url(domain).trim_end_matches('/'),
            domain.api_path()
        )
    }

    /// Reject documents whose base URLs cannot be used
    pub fn validate(&self) -> Result<()> {
        for domain in Domain::ALL {
            let url = self.base_url(domain).trim();
            if url.is_empty() {
                return Err(AppError::Validation(format!(
                    "missing base URL for {}",
                    domain
                )));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::Validation(format!(
                    "base URL for {} must be http(s): {}",
                    domain, url
                )));
            }
        }
        Ok(())
    }
}

/// Deployment environment selecting which bootstrap document to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Hub,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Hub => "hub",
            Environment::Production => "production",
        }
    }

    /// Path of the bootstrap document for this environment
    pub fn config_path(self) -> PathBuf {
        PathBuf::from(CONFIG_ASSET_DIR).join(format!("config.{}.json", self.as_str()))
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "hub" => Ok(Environment::Hub),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "Invalid environment '{}'. Use development, staging, hub or production",
                other
            )),
        }
    }
}

/// Where the bootstrap document is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Url(String),
    File(PathBuf),
}

impl ConfigSource {
    /// Interpret a location given on the command line or in the environment
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ConfigSource::Url(location.to_string())
        } else {
            ConfigSource::File(PathBuf::from(location))
        }
    }

    pub fn for_environment(env: Environment) -> Self {
        ConfigSource::File(env.config_path())
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Url(url) => write!(f, "{}", url),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
