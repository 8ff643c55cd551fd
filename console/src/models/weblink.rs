//! Web link (bookmark) model

use super::{limit, require, timestamp, Domain, Resource, UsageStats, Validate};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLink {
    pub id: i64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::required")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebLink {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub area: String,
    pub category: String,
    pub sub_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebLink {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub area: String,
    pub category: String,
    pub sub_category: String,
    pub is_favorite: bool,
}

fn validate_link(url: &str, title: &str, description: Option<&str>) -> Result<()> {
    require("url", url, 500)?;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Validation(format!(
            "url must start with http:// or https://: {}",
            url
        )));
    }
    require("title", title, 200)?;
    limit("description", description, 500)
}

impl Validate for CreateWebLink {
    fn validate(&self) -> Result<()> {
        validate_link(&self.url, &self.title, self.description.as_deref())
    }
}

impl Validate for UpdateWebLink {
    fn validate(&self) -> Result<()> {
        validate_link(&self.url, &self.title, self.description.as_deref())
    }
}

impl Resource for WebLink {
    const DOMAIN: Domain = Domain::Links;

    type Create = CreateWebLink;
    type Update = UpdateWebLink;

    fn id(&self) -> i64 {
        self.id
    }

    fn usage(&self) -> UsageStats {
        UsageStats {
            usage_count: self.usage_count,
            last_used: self.last_used,
            is_favorite: self.is_favorite,
        }
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn duplicate(&self) -> CreateWebLink {
        CreateWebLink {
            url: self.url.clone(),
            title: format!("{} (copy)", self.title),
            description: self.description.clone(),
            area: self.area.clone(),
            category: self.category.clone(),
            sub_category: self.sub_category.clone(),
            is_favorite: Some(false),
        }
    }

    fn with_favorite(&self, is_favorite: bool) -> UpdateWebLink {
        UpdateWebLink {
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            area: self.area.clone(),
            category: self.category.clone(),
            sub_category: self.sub_category.clone(),
            is_favorite,
        }
    }
}
