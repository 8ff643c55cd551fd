//! Usage event classifier
//!
//! Decides which user gestures count as a *use* of a resource. Usage
//! statistics reflect consumption of the stored value. Opening a link counts,
//! as does copying a secret or a note body. Administrative gestures never
//! increment the counter.
//!
//! Every command routes its gestures through [`classify`]; no other code
//! decides whether to call the increment endpoint.

use crate::models::Domain;
use std::fmt;

/// Credential field a copy gesture targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretField {
    Username,
    Password,
    /// Username and password together
    FullRecord,
}

/// A user gesture on a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Open a card or row to look at its details
    Inspect,
    /// Scroll, page or switch tabs in a listing
    Browse,
    /// Open a web link in the browser
    OpenLink,
    /// Copy a credential field to the clipboard
    CopySecret(SecretField),
    /// Copy a note's free-text body
    CopyBody,
    /// Create a copy of the resource
    Duplicate,
    /// Edit and save the resource
    Edit,
    /// Add to or remove from favorites
    ToggleFavorite,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gesture::Inspect => f.write_str("inspect"),
            Gesture::Browse => f.write_str("browse"),
            Gesture::OpenLink => f.write_str("open-link"),
            Gesture::CopySecret(field) => write!(f, "copy-{:?}", field),
            Gesture::CopyBody => f.write_str("copy-body"),
            Gesture::Duplicate => f.write_str("duplicate"),
            Gesture::Edit => f.write_str("edit"),
            Gesture::ToggleFavorite => f.write_str("toggle-favorite"),
        }
    }
}

/// Outcome of classifying a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageClass {
    /// Increment the usage counter
    CountableUse,
    /// Leave the usage counter alone
    PassiveView,
}

impl UsageClass {
    pub fn is_countable(self) -> bool {
        matches!(self, UsageClass::CountableUse)
    }
}

/// Classify a gesture performed on a resource of `domain`.
///
/// A consuming gesture only counts in the domain it belongs to: opening is a
/// use of a link, copying a secret is a use of a credential, copying the
/// body is a use of a note.
pub fn classify(domain: Domain, gesture: Gesture) -> UsageClass {
    match (domain, gesture) {
        (Domain::Links, Gesture::OpenLink) => UsageClass::CountableUse,
        (Domain::Credentials, Gesture::CopySecret(_)) => UsageClass::CountableUse,
        (Domain::Notes, Gesture::CopyBody) => UsageClass::CountableUse,
        _ => UsageClass::PassiveView,
    }
}
