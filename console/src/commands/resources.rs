//! Resource commands
//!
//! Listing, viewing and administrative writes. None of these count as a use.

use crate::app::AppState;
use crate::error::Result;
use crate::models::{Domain, Facet, ListFilter, Page, SearchField};
use crate::services::adapter::DisplayRecord;

/// List one page of a domain
pub async fn list(
    state: &AppState,
    domain: Domain,
    filter: &ListFilter,
) -> Result<Page<DisplayRecord>> {
    state.section(domain).list(filter).await
}

/// Filter for one page, optionally narrowed by a search term
pub fn page_filter(search: Option<&str>, page_index: u32, page_size: u32) -> ListFilter {
    ListFilter {
        page_index: page_index.max(1),
        page_size: page_size.max(1),
        ..search.map(ListFilter::search).unwrap_or_default()
    }
}

/// Search a domain by name or content
pub async fn search(
    state: &AppState,
    domain: Domain,
    field: SearchField,
    term: &str,
) -> Result<Vec<DisplayRecord>> {
    state.section(domain).search(field, term).await
}

/// Resources sharing a classification value
pub async fn by_facet(
    state: &AppState,
    domain: Domain,
    facet: Facet,
    value: &str,
) -> Result<Vec<DisplayRecord>> {
    state.section(domain).by_facet(facet, value).await
}

/// Show a single resource
pub async fn show(state: &AppState, domain: Domain, id: i64) -> Result<DisplayRecord> {
    state.section(domain).inspect(id).await
}

/// Toggle the favorite flag, returning the new value
pub async fn favorite(state: &AppState, domain: Domain, id: i64) -> Result<bool> {
    state.section(domain).toggle_favorite(id).await
}

/// Duplicate a resource, returning the copy
pub async fn duplicate(state: &AppState, domain: Domain, id: i64) -> Result<DisplayRecord> {
    state.section(domain).duplicate(id).await
}

pub async fn delete(state: &AppState, domain: Domain, id: i64) -> Result<()> {
    state.section(domain).delete(id).await
}
