//! Credential (vault entry) model
//!
//! Besides the core login fields a credential may carry any number of
//! additional secrets (card PINs, secondary passwords, device codes). Those
//! are kept in an open `extra` map so new backend fields pass through
//! untouched.

use super::{limit, require, timestamp, Domain, Resource, SecretString, UsageStats, Validate};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub expired: bool,
    #[serde(rename = "expired_Date", default, deserialize_with = "timestamp::optional")]
    pub expired_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Additional backend fields, carried opaquely
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_active() -> bool {
    true
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("active", &self.active)
            .field("expired", &self.expired)
            .field("usage_count", &self.usage_count)
            .field("last_used", &self.last_used)
            .field("is_favorite", &self.is_favorite)
            .field("extra_fields", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Credential {
    /// Extra string fields, exposed as secrets
    pub fn extra_secrets(&self) -> BTreeMap<String, SecretString> {
        self.extra
            .iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) if !s.is_empty() => Some((key.clone(), SecretString::new(s.clone()))),
                _ => None,
            })
            .collect()
    }

    fn to_draft(&self) -> CredentialDraft {
        CredentialDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            email: self.email.clone(),
            url: self.url.clone(),
            area: self.area.clone(),
            section: self.section.clone(),
            note: self.note.clone(),
            active: self.active,
            expired: self.expired,
            expired_date: self.expired_date,
            is_favorite: self.is_favorite,
            extra: self.extra.clone(),
        }
    }
}

/// Payload for creating or updating a credential
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub username: String,
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub active: bool,
    pub expired: bool,
    #[serde(rename = "expired_Date")]
    pub expired_date: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl fmt::Debug for CredentialDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDraft")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("extra_fields", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Validate for CredentialDraft {
    fn validate(&self) -> Result<()> {
        require("name", &self.name, 100)?;
        limit("description", self.description.as_deref(), 500)?;
        require("username", &self.username, 100)?;
        require("password", self.password.expose(), 255)?;
        limit("email", self.email.as_deref(), 255)?;
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if !email.contains('@') {
                return Err(AppError::Validation(format!(
                    "email is not a valid address: {}",
                    email
                )));
            }
        }
        limit("url", self.url.as_deref(), 500)?;
        limit("note", self.note.as_deref(), 1000)?;
        if self.expired_date.is_none() {
            return Err(AppError::Validation("expiry date is required".to_string()));
        }
        Ok(())
    }
}

impl Resource for Credential {
    const DOMAIN: Domain = Domain::Credentials;

    type Create = CredentialDraft;
    type Update = CredentialDraft;

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

    fn duplicate(&self) -> CredentialDraft {
        CredentialDraft {
            name: format!("{} (copy)", self.name),
            is_favorite: false,
            ..self.to_draft()
        }
    }

    fn with_favorite(&self, is_favorite: bool) -> CredentialDraft {
        CredentialDraft {
            is_favorite,
            ..self.to_draft()
        }
    }
}
