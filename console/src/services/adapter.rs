//! Presentation adapter
//!
//! Normalizes credentials, web links and notes into one [`DisplayRecord`]
//! shape so the same ranking and list surfaces can render any domain.
//! Records are rebuilt from scratch on every refresh; nothing mutates them
//! in place.

use crate::models::{Credential, Domain, Note, SecretString, WebLink};
use crate::services::classifier::SecretField;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Fallback shown when a resource has neither area nor category
pub const DEFAULT_CATEGORY: &str = "General";

/// Domain-specific data carried through for action handlers
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Credential {
        username: String,
        password: SecretString,
        email: Option<String>,
        url: Option<String>,
        extra: BTreeMap<String, SecretString>,
    },
    Link {
        url: String,
        description: Option<String>,
    },
    Note {
        note_type: String,
        description: Option<String>,
        free_text: Option<String>,
    },
}

/// Generic display record for any resource
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRecord {
    pub id: i64,
    pub domain: Domain,
    pub display_name: String,
    pub subtitle: Option<String>,
    pub area: Option<String>,
    pub category: Option<String>,
    pub usage_count: u32,
    pub last_used: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    pub payload: Payload,
}

/// Conversion into a [`DisplayRecord`]
pub trait Present {
    fn present(&self) -> DisplayRecord;
}

/// Present a whole list, preserving order
pub fn present_all<R: Present>(items: &[R]) -> Vec<DisplayRecord> {
    items.iter().map(Present::present).collect()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn non_empty_opt(value: Option<&str>) -> Option<String> {
    value.and_then(non_empty)
}

/// `"{category} • {sub_category}"` when both are set, otherwise the first
/// non-empty fallback
fn category_subtitle(category: &str, sub_category: &str, area: &str) -> Option<String> {
    match (non_empty(category), non_empty(sub_category)) {
        (Some(cat), Some(sub)) => Some(format!("{} • {}", cat, sub)),
        (Some(cat), None) => Some(cat),
        _ => non_empty(area),
    }
}

impl Present for WebLink {
    fn present(&self) -> DisplayRecord {
        DisplayRecord {
            id: self.id,
            domain: Domain::Links,
            display_name: non_empty(&self.title).unwrap_or_else(|| self.url.clone()),
            subtitle: category_subtitle(&self.category, &self.sub_category, &self.area),
            area: non_empty(&self.area),
            category: non_empty(&self.category),
            usage_count: self.usage_count,
            last_used: self.last_used,
            is_favorite: self.is_favorite,
            payload: Payload::Link {
                url: self.url.clone(),
                description: non_empty_opt(self.description.as_deref()),
            },
        }
    }
}

impl Present for Note {
    fn present(&self) -> DisplayRecord {
        DisplayRecord {
            id: self.id,
            domain: Domain::Notes,
            display_name: self.name.clone(),
            subtitle: category_subtitle(&self.category, &self.sub_category, &self.area),
            area: non_empty(&self.area),
            category: non_empty(&self.category),
            usage_count: self.usage_count,
            last_used: self.last_used,
            is_favorite: self.is_favorite,
            payload: Payload::Note {
                note_type: self.note_type.clone(),
                description: non_empty_opt(self.description.as_deref()),
                free_text: self.free_text.clone().filter(|t| !t.trim().is_empty()),
            },
        }
    }
}

impl Present for Credential {
    fn present(&self) -> DisplayRecord {
        DisplayRecord {
            id: self.id,
            domain: Domain::Credentials,
            display_name: self.name.clone(),
            subtitle: non_empty(&self.username)
                .or_else(|| non_empty_opt(self.section.as_deref()))
                .or_else(|| non_empty_opt(self.area.as_deref())),
            area: non_empty_opt(self.area.as_deref()),
            category: non_empty_opt(self.section.as_deref()),
            usage_count: self.usage_count,
            last_used: self.last_used,
            is_favorite: self.is_favorite,
            payload: Payload::Credential {
                username: self.username.clone(),
                password: self.password.clone(),
                email: non_empty_opt(self.email.as_deref()),
                url: non_empty_opt(self.url.as_deref()),
                extra: self.extra_secrets(),
            },
        }
    }
}

impl DisplayRecord {
    /// Area, else category, else [`DEFAULT_CATEGORY`]
    pub fn main_category(&self) -> &str {
        self.area
            .as_deref()
            .or(self.category.as_deref())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// URL opened by the open action, if this record has one
    pub fn open_url(&self) -> Option<&str> {
        match &self.payload {
            Payload::Link { url, .. } => Some(url),
            Payload::Credential { url, .. } => url.as_deref(),
            Payload::Note { .. } => None,
        }
    }

    /// Whether the copy action applies to this record
    pub fn can_copy(&self) -> bool {
        match &self.payload {
            Payload::Credential { .. } => true,
            Payload::Note { free_text, .. } => free_text.is_some(),
            Payload::Link { .. } => false,
        }
    }

    /// Text placed on the clipboard by the copy action.
    ///
    /// This is the only place secret values leave their wrapper. `field`
    /// selects the credential field and is ignored for notes.
    pub fn copy_text(&self, field: SecretField) -> Option<String> {
        match &self.payload {
            Payload::Credential {
                username,
                password,
                email,
                url,
                ..
            } => Some(match field {
                SecretField::Username => username.clone(),
                SecretField::Password => password.expose().to_string(),
                SecretField::FullRecord => format!(
                    "Name: {}\nUsername: {}\nPassword: {}\nEmail: {}\nURL: {}",
                    self.display_name,
                    username,
                    password.expose(),
                    email.as_deref().unwrap_or("N/A"),
                    url.as_deref().unwrap_or("N/A"),
                ),
            }),
            Payload::Note {
                free_text,
                description,
                ..
            } => free_text
                .clone()
                .or_else(|| description.clone())
                .or_else(|| Some(self.display_name.clone())),
            Payload::Link { .. } => None,
        }
    }
}

/// Relative description of a last-used timestamp
pub fn format_last_used(last_used: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = last_used else {
        return "Never used".to_string();
    };

    let seconds = (now - at).num_seconds().unsigned_abs();
    let days = seconds.div_ceil(86_400);

    match days {
        0 | 1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        3..=7 => format!("{} days ago", days),
        8..=30 => format!("{} weeks ago", days.div_ceil(7)),
        _ => at.format("%d/%m/%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn link(title: &str) -> WebLink {
        WebLink {
            id: 1,
            url: "https://example.com".to_string(),
            title: title.to_string(),
            description: None,
            area: "Dev".to_string(),
            category: "Tools".to_string(),
            sub_category: "CI".to_string(),
            usage_count: 3,
            is_favorite: true,
            last_used: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn note(free_text: Option<&str>) -> Note {
        Note {
            id: 2,
            name: "Deploy".to_string(),
            description: Some("How to deploy".to_string()),
            area: String::new(),
            category: "Ops".to_string(),
            sub_category: String::new(),
            note_type: "procedure".to_string(),
            free_text: free_text.map(str::to_string),
            usage_count: 0,
            is_favorite: false,
            last_used: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn credential() -> Credential {
        serde_json::from_str(
            r#"{"id":9,"name":"Mail","username":"anna","password":"pw-123",
                "url":"https://mail.example","pin":"0000"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_link_display_name_is_title() {
        let record = link("CI Dashboard").present();
        assert_eq!(record.display_name, "CI Dashboard");
        assert_eq!(record.subtitle.as_deref(), Some("Tools • CI"));
        assert_eq!(record.main_category(), "Dev");
        assert_eq!(record.open_url(), Some("https://example.com"));
        assert!(!record.can_copy());

        let untitled = link("  ").present();
        assert_eq!(untitled.display_name, "https://example.com");
    }

    #[test]
    fn test_note_carries_free_text() {
        let record = note(Some("kubectl apply -f app.yaml")).present();
        assert_eq!(record.display_name, "Deploy");
        assert_eq!(record.subtitle.as_deref(), Some("Ops"));
        assert_eq!(record.main_category(), "Ops");
        assert!(record.can_copy());
        assert_eq!(
            record.copy_text(SecretField::FullRecord).as_deref(),
            Some("kubectl apply -f app.yaml")
        );

        let without_body = note(Some("   ")).present();
        assert!(!without_body.can_copy());
        assert_eq!(
            without_body.copy_text(SecretField::FullRecord).as_deref(),
            Some("How to deploy")
        );
    }

    #[test]
    fn test_credential_secrets_only_leave_through_copy() {
        let record = credential().present();
        assert_eq!(record.subtitle.as_deref(), Some("anna"));
        assert_eq!(record.main_category(), DEFAULT_CATEGORY);

        let printed = format!("{:?}", record);
        assert!(!printed.contains("pw-123"));
        assert!(!printed.contains("0000"));

        assert_eq!(record.copy_text(SecretField::Password).as_deref(), Some("pw-123"));
        assert_eq!(record.copy_text(SecretField::Username).as_deref(), Some("anna"));
        let full = record.copy_text(SecretField::FullRecord).unwrap();
        assert!(full.contains("Password: pw-123"));
        assert!(full.contains("Email: N/A"));
        assert!(full.contains("URL: https://mail.example"));
    }

    #[test]
    fn test_present_all_keeps_order() {
        let mut second = link("Second");
        second.id = 2;
        let records = present_all(&[link("First"), second]);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_format_last_used() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        assert_eq!(format_last_used(None, now), "Never used");
        assert_eq!(format_last_used(Some(now - Duration::hours(3)), now), "Today");
        assert_eq!(format_last_used(Some(now - Duration::hours(30)), now), "Yesterday");
        assert_eq!(format_last_used(Some(now - Duration::days(5)), now), "5 days ago");
        assert_eq!(format_last_used(Some(now - Duration::days(20)), now), "3 weeks ago");
        assert_eq!(
            format_last_used(Some(Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()), now),
            "15/01/2024"
        );
    }
}
