//! Application state and initialization
//!
//! This module wires the bootstrap configuration, the three typed API
//! clients and the refresh coordinator together. Every write goes through a
//! [`DomainSection`], which follows a successful write with a targeted
//! refresh of the domain it touched.

use crate::config::{ConfigSource, CONFIG_CACHE_FILE};
use crate::error::Result;
use crate::models::{
    Credential, Domain, Facet, ListFilter, Note, Page, Resource, SearchField, WebLink,
};
use crate::services::adapter::{present_all, DisplayRecord, Present};
use crate::services::classifier::Gesture;
use crate::services::client::{build_http_client, ResourceClient};
use crate::services::config_service::{ConfigHandle, ConfigService};
use crate::services::coordinator::{Notification, RefreshCoordinator};
use crate::services::ranking::{RankingCount, RankingSource};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigHandle,
    pub coordinator: RefreshCoordinator,
    pub credentials: Arc<DomainSection<Credential>>,
    pub links: Arc<DomainSection<WebLink>>,
    pub notes: Arc<DomainSection<Note>>,
}

impl AppState {
    /// Build clients and start the refresh workers. Must be called inside a
    /// tokio runtime.
    pub fn new(http: reqwest::Client, config: ConfigHandle, count: RankingCount) -> Self {
        let credentials = ResourceClient::<Credential>::new(http.clone(), config.clone());
        let links = ResourceClient::<WebLink>::new(http.clone(), config.clone());
        let notes = ResourceClient::<Note>::new(http, config.clone());

        let sources: Vec<Arc<dyn RankingSource>> = vec![
            Arc::new(credentials.clone()),
            Arc::new(links.clone()),
            Arc::new(notes.clone()),
        ];
        let coordinator = RefreshCoordinator::new(sources, count);

        Self {
            config,
            credentials: Arc::new(DomainSection::new(credentials, coordinator.clone())),
            links: Arc::new(DomainSection::new(links, coordinator.clone())),
            notes: Arc::new(DomainSection::new(notes, coordinator.clone())),
            coordinator,
        }
    }

    /// Domain-agnostic operations on one section
    pub fn section(&self, domain: Domain) -> &dyn SectionOps {
        match domain {
            Domain::Credentials => self.credentials.as_ref(),
            Domain::Links => self.links.as_ref(),
            Domain::Notes => self.notes.as_ref(),
        }
    }
}

/// Options used to bring the application up
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub source: ConfigSource,
    pub cache_dir: PathBuf,
    pub count: RankingCount,
}

/// Application setup - called once on startup
pub async fn setup(options: StartupOptions) -> Result<AppState> {
    tracing::info!("Initializing application");

    let http = build_http_client()?;

    let config_service = ConfigService::new(options.source, http.clone())
        .with_cache(options.cache_dir.join(CONFIG_CACHE_FILE));
    let handle = config_service.handle();
    config_service.load().await?;

    let state = AppState::new(http, handle, options.count);

    tracing::info!("Application initialized successfully");

    Ok(state)
}

/// Display-level operations every section supports
#[async_trait]
pub trait SectionOps: Send + Sync {
    fn domain(&self) -> Domain;

    /// Paginated listing; browsing never counts as a use
    async fn list(&self, filter: &ListFilter) -> Result<Page<DisplayRecord>>;

    /// Fetch one record without recording any gesture
    async fn fetch(&self, id: i64) -> Result<DisplayRecord>;

    /// Fetch one record for viewing (a passive gesture)
    async fn inspect(&self, id: i64) -> Result<DisplayRecord>;

    async fn search(&self, field: SearchField, term: &str) -> Result<Vec<DisplayRecord>>;

    async fn by_facet(&self, facet: Facet, value: &str) -> Result<Vec<DisplayRecord>>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Flip the favorite flag, returning the new value
    async fn toggle_favorite(&self, id: i64) -> Result<bool>;

    /// Create a copy of a resource, returning the copy
    async fn duplicate(&self, id: i64) -> Result<DisplayRecord>;
}

/// Typed client paired with the coordinator that refreshes its domain
pub struct DomainSection<R> {
    client: ResourceClient<R>,
    coordinator: RefreshCoordinator,
}

impl<R: Resource + Present> DomainSection<R> {
    pub fn new(client: ResourceClient<R>, coordinator: RefreshCoordinator) -> Self {
        Self {
            client,
            coordinator,
        }
    }

    /// Refresh after a write, or notify when the write failed
    async fn after_write<T>(&self, action: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                if let Err(e) = self.coordinator.refresh_one(R::DOMAIN).await {
                    tracing::warn!("{} succeeded but refresh of {} failed: {}", action, R::DOMAIN, e);
                }
                Ok(value)
            }
            Err(e) => {
                tracing::error!("{} failed for {}: {}", action, R::DOMAIN, e);
                self.coordinator
                    .notify(Notification::error(R::DOMAIN, format!("{} failed: {}", action, e)));
                Err(e)
            }
        }
    }

    pub async fn create(&self, payload: &R::Create) -> Result<R> {
        let result = self.client.create(payload).await;
        let created = self.after_write("Create", result).await?;

        tracing::info!("Created {} {}: {}", R::DOMAIN, created.id(), created.label());
        Ok(created)
    }

    pub async fn update(&self, id: i64, payload: &R::Update) -> Result<Option<R>> {
        let result = self.client.update(id, payload).await;
        self.after_write("Update", result).await
    }

    async fn gesture(&self, gesture: Gesture, id: i64) -> Result<()> {
        self.coordinator
            .record_gesture(R::DOMAIN, gesture, id)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl<R: Resource + Present> SectionOps for DomainSection<R> {
    fn domain(&self) -> Domain {
        R::DOMAIN
    }

    async fn list(&self, filter: &ListFilter) -> Result<Page<DisplayRecord>> {
        let page = self.client.list(filter).await?;

        Ok(Page {
            items: present_all(&page.items),
            total_count: page.total_count,
            page_index: page.page_index,
            page_size: page.page_size,
            total_pages: page.total_pages,
            has_previous_page: page.has_previous_page,
            has_next_page: page.has_next_page,
        })
    }

    async fn fetch(&self, id: i64) -> Result<DisplayRecord> {
        Ok(self.client.get(id).await?.present())
    }

    async fn inspect(&self, id: i64) -> Result<DisplayRecord> {
        let record = self.fetch(id).await?;
        self.gesture(Gesture::Inspect, id).await?;
        Ok(record)
    }

    async fn search(&self, field: SearchField, term: &str) -> Result<Vec<DisplayRecord>> {
        Ok(present_all(&self.client.search(field, term).await?))
    }

    async fn by_facet(&self, facet: Facet, value: &str) -> Result<Vec<DisplayRecord>> {
        Ok(present_all(&self.client.by_facet(facet, value).await?))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = self.client.delete(id).await;
        self.after_write("Delete", result).await?;

        tracing::info!("Deleted {} {}", R::DOMAIN, id);
        self.coordinator
            .notify(Notification::info(R::DOMAIN, format!("Deleted item {}", id)));
        Ok(())
    }

    async fn toggle_favorite(&self, id: i64) -> Result<bool> {
        let current = self.client.get(id).await?;
        let is_favorite = !current.usage().is_favorite;

        self.gesture(Gesture::ToggleFavorite, id).await?;
        let result = self.client.update(id, &current.with_favorite(is_favorite)).await;
        self.after_write("Favorite", result).await?;

        Ok(is_favorite)
    }

    async fn duplicate(&self, id: i64) -> Result<DisplayRecord> {
        let original = self.client.get(id).await?;

        self.gesture(Gesture::Duplicate, id).await?;
        let copy = self.create(&original.duplicate()).await?;
        Ok(copy.present())
    }
}
