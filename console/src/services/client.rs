//! Resource API client
//!
//! One generic client serves all three domains; they expose the same REST
//! surface below their own base URL. The base URL is resolved from the
//! current bootstrap configuration on every request.

use crate::config::{REQUEST_TIMEOUT, USER_AGENT};
use crate::error::{AppError, Result};
use crate::models::{
    Credential, Domain, DomainSummary, Facet, ListFilter, Note, Page, Resource, SearchField,
    Validate, WebLink,
};
use crate::services::adapter::{present_all, DisplayRecord, Present};
use crate::services::config_service::ConfigHandle;
use crate::services::ranking::{RankingCount, RankingCriterion, RankingSource};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::marker::PhantomData;

pub type CredentialsClient = ResourceClient<Credential>;
pub type LinksClient = ResourceClient<WebLink>;
pub type NotesClient = ResourceClient<Note>;

/// Build the HTTP client shared by every API client
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::Generic(format!("Failed to create HTTP client: {}", e)))
}

/// List endpoints answer with a page object or, on older backends, a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Paged(Page<T>),
    Bare(Vec<T>),
}

/// Typed client for one domain's API
pub struct ResourceClient<R> {
    http: reqwest::Client,
    config: ConfigHandle,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(http: reqwest::Client, config: ConfigHandle) -> Self {
        Self {
            http,
            config,
            _resource: PhantomData,
        }
    }

    pub fn domain(&self) -> Domain {
        R::DOMAIN
    }

    /// Collection URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let config = self.config.require()?;
        let base = config.collection_url(R::DOMAIN);

        let mut url = Url::parse(&base).map_err(|e| {
            AppError::ConfigUnavailable(format!("invalid {} base URL '{}': {}", R::DOMAIN, base, e))
        })?;

        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::ConfigUnavailable(format!("{} base URL cannot carry a path", R::DOMAIN))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }

        Ok(url)
    }

    /// Send a request and turn a non-2xx answer into a remote failure
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body
        };

        tracing::debug!("{} API answered {}: {}", R::DOMAIN, status, message);
        Err(AppError::remote(Some(status.as_u16()), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.http.get(url)).await?;
        Ok(response.json().await?)
    }

    /// Paginated listing
    pub async fn list(&self, filter: &ListFilter) -> Result<Page<R>> {
        let url = self.endpoint(&[])?;
        tracing::debug!("GET {} {:?}", url, filter);

        let response = self.send(self.http.get(url).query(&filter.to_query())).await?;
        let body: ListBody<R> = response.json().await?;

        Ok(match body {
            ListBody::Paged(page) => page,
            ListBody::Bare(items) => Page::single(items),
        })
    }

    pub async fn get(&self, id: i64) -> Result<R> {
        self.get_json(self.endpoint(&[&id.to_string()])?).await
    }

    /// Create a resource; the payload is validated locally first
    pub async fn create(&self, payload: &R::Create) -> Result<R> {
        payload.validate()?;

        let url = self.endpoint(&[])?;
        tracing::debug!("POST {}", url);

        let response = self.send(self.http.post(url).json(payload)).await?;
        Ok(response.json().await?)
    }

    /// Update a resource. Some backends answer with an empty body, in which
    /// case `None` is returned.
    pub async fn update(&self, id: i64, payload: &R::Update) -> Result<Option<R>> {
        payload.validate()?;

        let url = self.endpoint(&[&id.to_string()])?;
        tracing::debug!("PUT {}", url);

        let response = self.send(self.http.put(url).json(payload)).await?;
        let bytes = response.bytes().await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let url = self.endpoint(&[&id.to_string()])?;
        tracing::debug!("DELETE {}", url);

        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    /// Ranked list for one criterion, capped at `count`
    pub async fn ranking(&self, criterion: RankingCriterion, count: RankingCount) -> Result<Vec<R>> {
        let url = self.endpoint(&[criterion.endpoint()])?;
        tracing::debug!("GET {} count={}", url, count.get());

        let response = self
            .send(self.http.get(url).query(&[("count", count.get())]))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn most_used(&self, count: RankingCount) -> Result<Vec<R>> {
        self.ranking(RankingCriterion::MostUsed, count).await
    }

    pub async fn recent(&self, count: RankingCount) -> Result<Vec<R>> {
        self.ranking(RankingCriterion::Recent, count).await
    }

    pub async fn favorites(&self, count: RankingCount) -> Result<Vec<R>> {
        self.ranking(RankingCriterion::Favorites, count).await
    }

    /// Resources most recently edited, independent of usage
    pub async fn recently_updated(&self, count: RankingCount) -> Result<Vec<R>> {
        let url = self.endpoint(&["recently-updated"])?;
        let response = self
            .send(self.http.get(url).query(&[("count", count.get())]))
            .await?;
        Ok(response.json().await?)
    }

    /// All ranking lists in one round trip
    pub async fn summary(&self) -> Result<DomainSummary<R>> {
        self.get_json(self.endpoint(&["summary"])?).await
    }

    pub async fn by_facet(&self, facet: Facet, value: &str) -> Result<Vec<R>> {
        if value.trim().is_empty() {
            return Err(AppError::Validation("facet value is required".to_string()));
        }
        self.get_json(self.endpoint(&[facet.path_segment(), value.trim()])?)
            .await
    }

    pub async fn search(&self, field: SearchField, term: &str) -> Result<Vec<R>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AppError::Validation("search term is required".to_string()));
        }

        let segments: Vec<&str> = field.path_segment().split('/').collect();
        let url = self.endpoint(&segments)?;
        tracing::debug!("GET {} searchTerm={}", url, term);

        let response = self
            .send(self.http.get(url).query(&[("searchTerm", term)]))
            .await?;
        Ok(response.json().await?)
    }

    /// Record one use of a resource
    pub async fn increment_usage(&self, id: i64) -> Result<()> {
        let url = self.endpoint(&[&id.to_string(), "increment-usage"])?;
        tracing::debug!("POST {}", url);

        self.send(self.http.post(url).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<R: Resource + Present> RankingSource for ResourceClient<R> {
    fn domain(&self) -> Domain {
        R::DOMAIN
    }

    async fn ranked(
        &self,
        criterion: RankingCriterion,
        count: RankingCount,
    ) -> Result<Vec<DisplayRecord>> {
        let items = self.ranking(criterion, count).await?;
        Ok(present_all(&items))
    }

    async fn increment_usage(&self, id: i64) -> Result<()> {
        ResourceClient::increment_usage(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn config(base: &str) -> ConfigHandle {
        ConfigHandle::fixed(AppConfig {
            app_name: "Desk".to_string(),
            credentials_api_base_url: base.to_string(),
            weblinks_api_base_url: base.to_string(),
            notes_api_base_url: base.to_string(),
            managements_api_base_url: None,
            reports_api_base_url: None,
        })
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = NotesClient::new(reqwest::Client::new(), config("https://host/"));
        let url = client.endpoint(&["7", "increment-usage"]).unwrap();
        assert_eq!(url.as_str(), "https://host/api/notes/7/increment-usage");
    }

    #[test]
    fn test_endpoint_encodes_values() {
        let client = LinksClient::new(reqwest::Client::new(), config("https://host"));
        let url = client.endpoint(&["by-category", "CI / CD"]).unwrap();
        assert_eq!(url.as_str(), "https://host/api/weblinks/by-category/CI%20%2F%20CD");
    }

    #[test]
    fn test_endpoint_requires_valid_base() {
        let client = CredentialsClient::new(reqwest::Client::new(), config("not a url"));
        assert!(matches!(
            client.endpoint(&[]),
            Err(AppError::ConfigUnavailable(_))
        ));
    }

    #[test]
    fn test_list_body_accepts_array() {
        let body: ListBody<u32> = serde_json::from_str("[1,2,3]").unwrap();
        assert!(matches!(body, ListBody::Bare(items) if items.len() == 3));
    }
}
