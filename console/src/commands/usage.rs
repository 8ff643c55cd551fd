//! Usage commands
//!
//! Opening a link and copying a secret or note body are the only commands
//! that count as a use. Both perform the action first and then route the
//! gesture through the coordinator, so a failed copy is never counted.

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::models::Domain;
use crate::services::classifier::{Gesture, SecretField};
use crate::services::coordinator::GestureOutcome;
use std::process::Command;

/// Open a web link in the default browser and record the use
pub async fn open_link(state: &AppState, id: i64) -> Result<String> {
    let record = state.section(Domain::Links).fetch(id).await?;
    let url = record
        .open_url()
        .ok_or_else(|| AppError::Validation(format!("link {} has no URL", id)))?
        .to_string();

    launch_browser(&url)?;
    tracing::info!("Opened link {}: {}", id, url);

    state
        .coordinator
        .record_gesture(Domain::Links, Gesture::OpenLink, id)
        .await?;

    Ok(url)
}

/// Where copied text goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    /// The system clipboard
    Clipboard,
    /// Handed back to the caller to print
    Stdout,
}

/// Copy text produced by a copy command, plus whether the use was counted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyResult {
    pub text: String,
    pub counted: bool,
}

/// Copy a credential field or a note body to `target` and record the use.
/// Links have nothing to copy.
pub async fn copy_value(
    state: &AppState,
    domain: Domain,
    id: i64,
    field: SecretField,
    target: CopyTarget,
) -> Result<CopyResult> {
    let gesture = match domain {
        Domain::Credentials => Gesture::CopySecret(field),
        Domain::Notes => Gesture::CopyBody,
        Domain::Links => {
            return Err(AppError::Validation(
                "links have nothing to copy; use `open` instead".to_string(),
            ))
        }
    };

    let record = state.section(domain).fetch(id).await?;
    if domain == Domain::Notes && !record.can_copy() {
        return Err(AppError::Validation(format!("note {} has no text to copy", id)));
    }

    let text = record
        .copy_text(field)
        .ok_or_else(|| AppError::Validation(format!("{} {} cannot be copied", domain, id)))?;

    if target == CopyTarget::Clipboard {
        write_clipboard(&text)?;
        tracing::info!("Copied {} {} to the clipboard", domain, id);
    }

    let outcome = state.coordinator.record_gesture(domain, gesture, id).await?;

    Ok(CopyResult {
        text,
        counted: matches!(outcome, GestureOutcome::Counted(_)),
    })
}

fn write_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| AppError::Clipboard(e.to_string()))
}

/// Hand a URL to the platform's default handler
fn launch_browser(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Validation(format!("refusing to open non-web URL: {}", url)));
    }

    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    command
        .spawn()
        .map_err(|e| AppError::Generic(format!("Failed to launch browser: {}", e)))?;

    Ok(())
}
