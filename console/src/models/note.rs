//! Technical note model
//!
//! `note_type` is free text on the backend; the console uses values such as
//! "command", "procedure", "general information" and "technical note".

use super::{limit, require, timestamp, Domain, Resource, UsageStats, Validate};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(rename = "type", default)]
    pub note_type: String,
    #[serde(default)]
    pub free_text: Option<String>,
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
pub struct CreateNote {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub area: String,
    pub category: String,
    pub sub_category: String,
    #[serde(rename = "type")]
    pub note_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNote {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub area: String,
    pub category: String,
    pub sub_category: String,
    #[serde(rename = "type")]
    pub note_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
    pub is_favorite: bool,
}

fn validate_note(name: &str, description: Option<&str>, note_type: &str) -> Result<()> {
    require("name", name, 200)?;
    limit("description", description, 500)?;
    require("type", note_type, 50)
}

impl Validate for CreateNote {
    fn validate(&self) -> Result<()> {
        validate_note(&self.name, self.description.as_deref(), &self.note_type)
    }
}

impl Validate for UpdateNote {
    fn validate(&self) -> Result<()> {
        validate_note(&self.name, self.description.as_deref(), &self.note_type)
    }
}

impl Resource for Note {
    const DOMAIN: Domain = Domain::Notes;

    type Create = CreateNote;
    type Update = UpdateNote;

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
        &self.name
    }

    fn duplicate(&self) -> CreateNote {
        CreateNote {
            name: format!("{} (copy)", self.name),
            description: self.description.clone(),
            area: self.area.clone(),
            category: self.category.clone(),
            sub_category: self.sub_category.clone(),
            note_type: self.note_type.clone(),
            free_text: self.free_text.clone(),
            is_favorite: Some(false),
        }
    }

    fn with_favorite(&self, is_favorite: bool) -> UpdateNote {
        UpdateNote {
            name: self.name.clone(),
            description: self.description.clone(),
            area: self.area.clone(),
            category: self.category.clone(),
            sub_category: self.sub_category.clone(),
            note_type: self.note_type.clone(),
            free_text: self.free_text.clone(),
            is_favorite,
        }
    }
}
