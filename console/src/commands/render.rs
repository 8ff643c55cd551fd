//! Plain-text rendering for terminal output
//!
//! Secrets never appear here; credential payloads only show the username.

use crate::models::Page;
use crate::services::adapter::{format_last_used, DisplayRecord, Payload};
use crate::services::ranking::{DomainState, RankingCriterion, RankingSnapshot};
use chrono::{DateTime, Utc};
use std::fmt::Write;

fn star(record: &DisplayRecord) -> &'static str {
    if record.is_favorite {
        "*"
    } else {
        " "
    }
}

/// One line per record: id, favorite marker, name, usage
pub fn record_line(record: &DisplayRecord, now: DateTime<Utc>) -> String {
    let mut line = format!("{:>6} {} {}", record.id, star(record), record.display_name);
    if let Some(subtitle) = &record.subtitle {
        let _ = write!(line, " ({})", subtitle);
    }
    let _ = write!(
        line,
        "  [{} uses, {}]",
        record.usage_count,
        format_last_used(record.last_used, now)
    );
    line
}

fn snapshot_block(out: &mut String, snapshot: &RankingSnapshot, now: DateTime<Utc>) {
    let _ = writeln!(out, "  {}", snapshot.criterion.title());
    if snapshot.is_empty() {
        let _ = writeln!(out, "    (none)");
        return;
    }
    for record in &snapshot.items {
        let _ = writeln!(out, "  {}", record_line(record, now));
    }
}

/// All ranking lists of one domain
pub fn domain_state(state: &DomainState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = write!(out, "== {} ==", state.domain.title());
    if state.loading {
        out.push_str(" (loading)");
    }
    out.push('\n');

    if let Some(error) = &state.last_error {
        let _ = writeln!(out, "  ! {}", error);
    }

    if !state.is_loaded() {
        let _ = writeln!(out, "  not loaded yet");
        return out;
    }

    for criterion in RankingCriterion::ALL {
        snapshot_block(&mut out, state.snapshot(criterion), now);
    }
    out
}

/// The whole dashboard
pub fn dashboard(states: &[DomainState], now: DateTime<Utc>) -> String {
    states
        .iter()
        .map(|state| domain_state(state, now))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn page(page: &Page<DisplayRecord>, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for record in &page.items {
        let _ = writeln!(out, "{}", record_line(record, now));
    }
    let _ = write!(
        out,
        "page {}/{} ({} total)",
        page.page_index,
        page.total_pages.max(1),
        page.total_count
    );
    out
}

pub fn records(items: &[DisplayRecord], now: DateTime<Utc>) -> String {
    if items.is_empty() {
        return "no results".to_string();
    }
    items
        .iter()
        .map(|record| record_line(record, now))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Detailed view of one record
pub fn detail(record: &DisplayRecord, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} #{}", record.display_name, record.id);
    let _ = writeln!(out, "  domain:    {}", record.domain);
    let _ = writeln!(out, "  category:  {}", record.main_category());
    if let Some(subtitle) = &record.subtitle {
        let _ = writeln!(out, "  subtitle:  {}", subtitle);
    }
    let _ = writeln!(out, "  favorite:  {}", if record.is_favorite { "yes" } else { "no" });
    let _ = writeln!(
        out,
        "  usage:     {} ({})",
        record.usage_count,
        format_last_used(record.last_used, now)
    );

    match &record.payload {
        Payload::Credential {
            username,
            email,
            url,
            extra,
            ..
        } => {
            let _ = writeln!(out, "  username:  {}", username);
            let _ = writeln!(out, "  password:  ***");
            if let Some(email) = email {
                let _ = writeln!(out, "  email:     {}", email);
            }
            if let Some(url) = url {
                let _ = writeln!(out, "  url:       {}", url);
            }
            for key in extra.keys() {
                let _ = writeln!(out, "  {}: ***", key);
            }
        }
        Payload::Link { url, description } => {
            let _ = writeln!(out, "  url:       {}", url);
            if let Some(description) = description {
                let _ = writeln!(out, "  about:     {}", description);
            }
        }
        Payload::Note {
            note_type,
            description,
            free_text,
        } => {
            let _ = writeln!(out, "  type:      {}", note_type);
            if let Some(description) = description {
                let _ = writeln!(out, "  about:     {}", description);
            }
            if let Some(text) = free_text {
                let _ = writeln!(out, "\n{}", text);
            }
        }
    }

    out.trim_end().to_string()
}
