//! Console commands
//!
//! This module organizes commands into logical submodules:
//! - `dashboard`: Ranking dashboard and live watch
//! - `resources`: Listing, viewing and administrative writes
//! - `usage`: Commands that count as a use (open, copy)
//! - `render`: Plain-text output

pub mod dashboard;
pub mod render;
pub mod resources;
pub mod usage;

use crate::app::AppState;
use crate::error::Result;
use crate::models::Domain;

// Re-export all commands for convenient dispatch in main.rs
pub use dashboard::*;
pub use resources::*;
pub use usage::*;

// ===== General Commands =====

/// Resolved bootstrap configuration as shown by `config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigInfo {
    pub version: String,
    pub app_name: String,
    pub endpoints: Vec<(Domain, String)>,
    pub managements_api_base_url: Option<String>,
    pub reports_api_base_url: Option<String>,
}

pub fn config_info(state: &AppState) -> Result<ConfigInfo> {
    let config = state.config.require()?;

    Ok(ConfigInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app_name: config.app_name.clone(),
        endpoints: Domain::ALL
            .iter()
            .map(|domain| (*domain, config.collection_url(*domain)))
            .collect(),
        managements_api_base_url: config.managements_api_base_url.clone(),
        reports_api_base_url: config.reports_api_base_url.clone(),
    })
}

impl std::fmt::Display for ConfigInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} (deskconsole {})", self.app_name, self.version)?;
        for (domain, url) in &self.endpoints {
            writeln!(f, "  {:<12} {}", domain.as_str(), url)?;
        }
        if let Some(url) = &self.managements_api_base_url {
            writeln!(f, "  {:<12} {}", "managements", url)?;
        }
        if let Some(url) = &self.reports_api_base_url {
            writeln!(f, "  {:<12} {}", "reports", url)?;
        }
        Ok(())
    }
}
