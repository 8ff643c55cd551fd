//! Bootstrap configuration service
//!
//! Loads the bootstrap document once at startup and publishes it through a
//! watch channel. Components receive a [`ConfigHandle`] in their
//! constructor and read the current snapshot on every request, so a late
//! subscriber always sees the value that was published before it arrived.
//!
//! A copy of every successfully loaded document is written to disk. When the
//! source cannot be read at startup the cached copy is published instead.

use crate::config::{AppConfig, ConfigSource};
use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::watch;

type Snapshot = Option<Arc<AppConfig>>;

/// Read side of the configuration, cheap to clone
#[derive(Clone)]
pub struct ConfigHandle {
    rx: watch::Receiver<Snapshot>,
}

impl ConfigHandle {
    /// Handle that is resolved from the start and never changes
    pub fn fixed(config: AppConfig) -> Self {
        let (_tx, rx) = watch::channel(Some(Arc::new(config)));
        Self { rx }
    }

    /// Current snapshot, `None` until the bootstrap document is loaded
    pub fn current(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Current snapshot, failing fast when nothing has been published yet
    pub fn require(&self) -> Result<Arc<AppConfig>> {
        self.current().ok_or_else(|| {
            AppError::ConfigUnavailable("bootstrap configuration has not been loaded".to_string())
        })
    }

    /// Wait until a configuration is published
    pub async fn ready(&self) -> Result<Arc<AppConfig>> {
        let mut rx = self.rx.clone();
        let snapshot = rx.wait_for(|value| value.is_some()).await.map_err(|_| {
            AppError::ConfigUnavailable("configuration service stopped before loading".to_string())
        })?;
        snapshot
            .clone()
            .ok_or_else(|| AppError::ConfigUnavailable("configuration not published".to_string()))
    }

    /// Raw receiver for callers that want change notifications
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.rx.clone()
    }
}

/// Loads and publishes the bootstrap document
pub struct ConfigService {
    source: ConfigSource,
    cache_path: Option<PathBuf>,
    http: reqwest::Client,
    tx: watch::Sender<Snapshot>,
}

impl ConfigService {
    pub fn new(source: ConfigSource, http: reqwest::Client) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            source,
            cache_path: None,
            http,
            tx,
        }
    }

    /// Keep an on-disk copy of the document at `path`
    pub fn with_cache(mut self, path: PathBuf) -> Self {
        self.cache_path = Some(path);
        self
    }

    pub fn handle(&self) -> ConfigHandle {
        ConfigHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Load the document once; later calls return the published value.
    pub async fn load(&self) -> Result<Arc<AppConfig>> {
        if let Some(current) = self.tx.borrow().clone() {
            return Ok(current);
        }

        tracing::info!("Loading bootstrap configuration from {}", self.source);

        let config = match self.fetch().await.and_then(|c| c.validate().map(|_| c)) {
            Ok(config) => {
                if let Err(e) = self.write_cache(&config).await {
                    tracing::warn!("Failed to cache bootstrap configuration: {}", e);
                }
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from {}: {}", self.source, e);
                match self.read_cache().await {
                    Some(cached) => {
                        tracing::info!("Using cached bootstrap configuration");
                        cached
                    }
                    None => {
                        return Err(AppError::ConfigUnavailable(format!(
                            "{}: {}",
                            self.source, e
                        )))
                    }
                }
            }
        };

        let config = Arc::new(config);
        self.tx.send_replace(Some(Arc::clone(&config)));

        tracing::info!(
            "Configuration loaded for {} (credentials: {}, links: {}, notes: {})",
            config.app_name,
            config.credentials_api_base_url,
            config.weblinks_api_base_url,
            config.notes_api_base_url
        );

        Ok(config)
    }

    async fn fetch(&self) -> Result<AppConfig> {
        match &self.source {
            ConfigSource::Url(url) => {
                let response = self.http.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(AppError::remote(
                        Some(status.as_u16()),
                        format!("bootstrap document request failed: {}", status),
                    ));
                }
                Ok(response.json().await?)
            }
            ConfigSource::File(path) => {
                let raw = fs::read_to_string(path).await?;
                Ok(serde_json::from_str(&raw)?)
            }
        }
    }

    async fn write_cache(&self, config: &AppConfig) -> Result<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(config)?;
        fs::write(path, json).await?;

        tracing::debug!("Bootstrap configuration cached at {:?}", path);
        Ok(())
    }

    async fn read_cache(&self) -> Option<AppConfig> {
        let path = self.cache_path.as_ref()?;
        let raw = fs::read_to_string(path).await.ok()?;

        match serde_json::from_str::<AppConfig>(&raw) {
            Ok(config) if config.validate().is_ok() => Some(config),
            Ok(_) => {
                tracing::warn!("Ignoring invalid cached configuration at {:?}", path);
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached configuration at {:?}: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"{
        "appName": "Desk",
        "credentialsApiBaseUrl": "https://vault.example",
        "weblinksApiBaseUrl": "https://links.example",
        "notesApiBaseUrl": "https://notes.example"
    }"#;

    fn service_for(path: PathBuf) -> ConfigService {
        ConfigService::new(ConfigSource::File(path), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_handle_fails_fast_before_load() {
        let temp = TempDir::new().unwrap();
        let service = service_for(temp.path().join("missing.json"));
        let handle = service.handle();

        assert!(handle.current().is_none());
        assert!(matches!(handle.require(), Err(AppError::ConfigUnavailable(_))));
    }

    #[tokio::test]
    async fn test_load_publishes_to_existing_and_late_handles() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.development.json");
        std::fs::write(&path, DOCUMENT).unwrap();

        let service = service_for(path);
        let early = service.handle();

        let loaded = service.load().await.unwrap();
        assert_eq!(loaded.app_name, "Desk");

        assert_eq!(early.require().unwrap().app_name, "Desk");
        let late = service.handle();
        assert_eq!(late.ready().await.unwrap().notes_api_base_url, "https://notes.example");
    }

    #[tokio::test]
    async fn test_load_is_one_shot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, DOCUMENT).unwrap();

        let service = service_for(path.clone());
        let first = service.load().await.unwrap();

        std::fs::remove_file(&path).unwrap();
        let second = service.load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_falls_back_to_cache() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        let cache = temp.path().join("cache").join("config.cache.json");
        std::fs::write(&path, DOCUMENT).unwrap();

        service_for(path.clone())
            .with_cache(cache.clone())
            .load()
            .await
            .unwrap();
        assert!(cache.exists());

        std::fs::remove_file(&path).unwrap();
        let service = service_for(path).with_cache(cache);
        let config = service.load().await.unwrap();
        assert_eq!(config.credentials_api_base_url, "https://vault.example");
    }

    #[tokio::test]
    async fn test_missing_source_without_cache_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let service = service_for(temp.path().join("nope.json"))
            .with_cache(temp.path().join("also-missing.json"));

        let result = service.load().await;
        assert!(matches!(result, Err(AppError::ConfigUnavailable(_))));
        assert!(service.handle().current().is_none());
    }

    #[tokio::test]
    async fn test_invalid_document_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"appName":"Desk","credentialsApiBaseUrl":"","weblinksApiBaseUrl":"https://l","notesApiBaseUrl":"https://n"}"#,
        )
        .unwrap();

        let result = service_for(path).load().await;
        assert!(matches!(result, Err(AppError::ConfigUnavailable(_))));
    }
}
