//! Domain models
//!
//! Rust structs mirroring the JSON exchanged with the three resource APIs.
//! All models use serde with camelCase field names, as the backends do.

pub mod credential;
pub mod note;
pub mod secret;
pub mod timestamp;
pub mod weblink;

pub use credential::{Credential, CredentialDraft};
pub use note::{CreateNote, Note, UpdateNote};
pub use secret::SecretString;
pub use weblink::{CreateWebLink, UpdateWebLink, WebLink};

use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_SORT_FIELD};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three parallel resource collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Credentials,
    Links,
    Notes,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Credentials, Domain::Links, Domain::Notes];

    /// Path of the collection below the domain's base URL
    pub fn api_path(self) -> &'static str {
        match self {
            Domain::Credentials => "api/credentials",
            Domain::Links => "api/weblinks",
            Domain::Notes => "api/notes",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Credentials => "credentials",
            Domain::Links => "links",
            Domain::Notes => "notes",
        }
    }

    /// Human readable section title
    pub fn title(self) -> &'static str {
        match self {
            Domain::Credentials => "Credentials",
            Domain::Links => "Web Links",
            Domain::Notes => "Notes",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credentials" | "credential" | "creds" => Ok(Domain::Credentials),
            "links" | "link" | "weblinks" | "weblink" => Ok(Domain::Links),
            "notes" | "note" => Ok(Domain::Notes),
            other => Err(format!(
                "Unknown domain '{}'. Use credentials, links or notes",
                other
            )),
        }
    }
}

/// Usage bookkeeping shared by every resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageStats {
    pub usage_count: u32,
    pub last_used: Option<DateTime<Utc>>,
    pub is_favorite: bool,
}

/// Local form constraints checked before a payload is sent
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Ensure a required text field is present and within its length limit
pub(crate) fn require(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    limit(field, Some(value), max)
}

/// Ensure an optional text field stays within its length limit
pub(crate) fn limit(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

/// A resource type served by one of the domain APIs
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    const DOMAIN: Domain;

    /// Payload accepted by `POST /{domain}`
    type Create: Serialize + Validate + Send + Sync;
    /// Payload accepted by `PUT /{domain}/{id}`
    type Update: Serialize + Validate + Send + Sync;

    fn id(&self) -> i64;

    fn usage(&self) -> UsageStats;

    /// Human readable name used in log lines
    fn label(&self) -> &str;

    /// Creation payload for a copy of this resource.
    /// The copy starts with fresh usage statistics.
    fn duplicate(&self) -> Self::Create;

    /// Update payload identical to the current resource apart from the favorite flag
    fn with_favorite(&self, is_favorite: bool) -> Self::Update;
}

/// Paginated result returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_index: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// Wrap a bare array answer into a single page
    pub fn single(items: Vec<T>) -> Self {
        let len = items.len();
        Self {
            items,
            total_count: len as u64,
            page_index: 1,
            page_size: len as u32,
            total_pages: u32::from(len > 0),
            has_previous_page: false,
            has_next_page: false,
        }
    }
}

/// Query parameters for paginated listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub page_index: u32,
    pub page_size: u32,
    pub sort_field: String,
    pub sort_ascending: bool,
    pub search_term: Option<String>,
    pub active: Option<bool>,
    pub expired: Option<bool>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_ascending: true,
            search_term: None,
            active: None,
            expired: None,
        }
    }
}

impl ListFilter {
    /// Filter matching a free-text search, starting from the first page
    pub fn search(term: impl Into<String>) -> Self {
        let term = term.into().trim().to_lowercase();
        Self {
            search_term: (!term.is_empty()).then_some(term),
            ..Self::default()
        }
    }

    /// Query string pairs in the order the backends document them
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pageIndex", self.page_index.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("sortField", self.sort_field.clone()),
            ("sortAscending", self.sort_ascending.to_string()),
        ];

        if let Some(term) = &self.search_term {
            params.push(("searchTerm", term.clone()));
        }
        if let Some(active) = self.active {
            params.push(("active", active.to_string()));
        }
        if let Some(expired) = self.expired {
            params.push(("expired", expired.to_string()));
        }

        params
    }
}

/// Aggregated rankings returned by `GET /{domain}/summary`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSummary<T> {
    pub most_used: Option<Vec<T>>,
    pub favorites: Option<Vec<T>>,
    pub recently_used: Option<Vec<T>>,
}

/// Classification attribute usable in `GET /{domain}/by-{facet}/{value}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Area,
    Category,
    SubCategory,
    Type,
}

impl Facet {
    pub fn path_segment(self) -> &'static str {
        match self {
            Facet::Area => "by-area",
            Facet::Category => "by-category",
            Facet::SubCategory => "by-subcategory",
            Facet::Type => "by-type",
        }
    }
}

/// Field searched by `GET /{domain}/search/{field}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Content,
}

impl SearchField {
    pub fn path_segment(self) -> &'static str {
        match self {
            SearchField::Name => "search/name",
            SearchField::Content => "search/content",
        }
    }
}
