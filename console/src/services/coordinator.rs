//! Multi-surface refresh coordinator
//!
//! Every domain gets one worker task that owns the domain's
//! `watch::Sender<DomainState>`. Surfaces never write state; they send a
//! request and subscribe to the watch channel.
//!
//! A worker runs at most one fetch at a time. Requests that arrive while a
//! fetch is in flight wait in the queue and are all answered by a single
//! follow-up fetch once the current one finishes.

use crate::error::{AppError, Result};
use crate::models::Domain;
use crate::services::classifier::{classify, Gesture};
use crate::services::ranking::{
    fetch_rankings, DomainState, RankingCount, RankingSource, RefreshOutcome, RefreshPhase,
};
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const NOTIFICATION_CAPACITY: usize = 64;

/// Whether a refresh should show a loading indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// User initiated or initial load
    Loud,
    /// Background polling
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// User-visible message emitted by the coordinator and the app layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub domain: Option<Domain>,
    pub message: String,
}

impl Notification {
    pub fn error(domain: Domain, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            domain: Some(domain),
            message: message.into(),
        }
    }

    pub fn warning(domain: Domain, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            domain: Some(domain),
            message: message.into(),
        }
    }

    pub fn info(domain: Domain, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            domain: Some(domain),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        match self.domain {
            Some(domain) => write!(f, "[{}] {}: {}", level, domain, self.message),
            None => write!(f, "[{}] {}", level, self.message),
        }
    }
}

/// Result of routing a gesture through the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Passive view, nothing was sent
    Viewed,
    /// Countable use, usage incremented and the domain refreshed
    Counted(RefreshOutcome),
}

struct RefreshRequest {
    mode: RefreshMode,
    respond: oneshot::Sender<Result<RefreshOutcome>>,
}

struct Section {
    source: Arc<dyn RankingSource>,
    requests: mpsc::UnboundedSender<RefreshRequest>,
    state: watch::Receiver<DomainState>,
    cancel: CancellationToken,
}

struct Inner {
    sections: BTreeMap<Domain, Section>,
    notifications: broadcast::Sender<Notification>,
    shutdown: CancellationToken,
}

/// Serializes refreshes per domain and fans state out to every surface
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// Spawn one worker per source. Must be called inside a tokio runtime.
    pub fn new(sources: Vec<Arc<dyn RankingSource>>, count: RankingCount) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let shutdown = CancellationToken::new();
        let mut sections = BTreeMap::new();

        for source in sources {
            let domain = source.domain();
            let (state_tx, state_rx) = watch::channel(DomainState::new(domain));
            let (req_tx, req_rx) = mpsc::unbounded_channel();
            let cancel = shutdown.child_token();

            let worker = Worker {
                source: Arc::clone(&source),
                state: state_tx,
                requests: req_rx,
                cancel: cancel.clone(),
                notifications: notifications.clone(),
                count,
            };
            tokio::spawn(worker.run());

            tracing::debug!("Started refresh worker for {}", domain);

            sections.insert(
                domain,
                Section {
                    source,
                    requests: req_tx,
                    state: state_rx,
                    cancel,
                },
            );
        }

        Self {
            inner: Arc::new(Inner {
                sections,
                notifications,
                shutdown,
            }),
        }
    }

    fn section(&self, domain: Domain) -> Result<&Section> {
        match self.inner.sections.get(&domain) {
            Some(section) if !section.cancel.is_cancelled() => Ok(section),
            _ => Err(AppError::SectionClosed(domain)),
        }
    }

    /// Queue a refresh and hand back the receiver for its outcome
    fn enqueue(
        &self,
        domain: Domain,
        mode: RefreshMode,
    ) -> Result<oneshot::Receiver<Result<RefreshOutcome>>> {
        let section = self.section(domain)?;
        let (respond, rx) = oneshot::channel();

        section
            .requests
            .send(RefreshRequest { mode, respond })
            .map_err(|_| AppError::SectionClosed(domain))?;

        Ok(rx)
    }

    async fn request(&self, domain: Domain, mode: RefreshMode) -> Result<RefreshOutcome> {
        let rx = self.enqueue(domain, mode)?;
        // A dropped responder means the worker stopped before answering
        rx.await.map_err(|_| AppError::SectionClosed(domain))?
    }

    /// Refresh a single domain; other domains are untouched
    pub async fn refresh_one(&self, domain: Domain) -> Result<RefreshOutcome> {
        self.request(domain, RefreshMode::Loud).await
    }

    /// Refresh every open domain concurrently
    pub async fn refresh_all(&self, mode: RefreshMode) -> Vec<(Domain, Result<RefreshOutcome>)> {
        let domains: Vec<Domain> = self
            .inner
            .sections
            .iter()
            .filter(|(_, section)| !section.cancel.is_cancelled())
            .map(|(domain, _)| *domain)
            .collect();

        let results = join_all(domains.iter().map(|d| self.request(*d, mode))).await;
        domains.into_iter().zip(results).collect()
    }

    /// Record one use of `id` and refresh its domain.
    ///
    /// On failure the error is logged and notified and no refresh happens.
    pub async fn increment_and_refresh(&self, domain: Domain, id: i64) -> Result<RefreshOutcome> {
        let section = self.section(domain)?;

        if let Err(e) = section.source.increment_usage(id).await {
            tracing::error!("Failed to record use of {} {}: {}", domain, id, e);
            self.notify(Notification::error(
                domain,
                format!("Could not record use of item {}: {}", id, e),
            ));
            return Err(e);
        }

        tracing::debug!("Recorded use of {} {}", domain, id);
        self.refresh_one(domain).await
    }

    /// Classify a gesture and count it when it is a use
    pub async fn record_gesture(
        &self,
        domain: Domain,
        gesture: Gesture,
        id: i64,
    ) -> Result<GestureOutcome> {
        if !classify(domain, gesture).is_countable() {
            tracing::trace!("{} on {} {} is a passive view", gesture, domain, id);
            return Ok(GestureOutcome::Viewed);
        }

        self.increment_and_refresh(domain, id)
            .await
            .map(GestureOutcome::Counted)
    }

    /// Start background polling. The first tick fires immediately and is a
    /// loud refresh; later ticks are silent.
    pub fn start_polling(&self, interval: Duration) -> PollingHandle {
        let token = self.inner.shutdown.child_token();
        let coordinator = self.clone();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut mode = RefreshMode::Loud;

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        tracing::trace!("Polling tick ({:?})", mode);
                        tokio::select! {
                            _ = task_token.cancelled() => break,
                            _ = coordinator.refresh_all(mode) => {}
                        }
                        mode = RefreshMode::Silent;
                    }
                }
            }

            tracing::debug!("Polling stopped");
        });

        tracing::info!("Polling every {:?}", interval);
        PollingHandle { token, task }
    }

    /// Tear down one domain. An in-flight fetch is discarded and later
    /// requests fail with [`AppError::SectionClosed`].
    pub fn close_section(&self, domain: Domain) {
        if let Some(section) = self.inner.sections.get(&domain) {
            if !section.cancel.is_cancelled() {
                tracing::info!("Closing {} section", domain);
                section.cancel.cancel();
            }
        }
    }

    pub fn is_open(&self, domain: Domain) -> bool {
        self.section(domain).is_ok()
    }

    /// Stop every worker and polling task
    pub fn shutdown(&self) {
        tracing::info!("Shutting down refresh coordinator");
        self.inner.shutdown.cancel();
    }

    pub fn subscribe(&self, domain: Domain) -> Option<watch::Receiver<DomainState>> {
        self.inner.sections.get(&domain).map(|s| s.state.clone())
    }

    /// Latest published state of a domain
    pub fn snapshot(&self, domain: Domain) -> Option<DomainState> {
        self.inner
            .sections
            .get(&domain)
            .map(|s| s.state.borrow().clone())
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    /// Publish a notification; dropped silently when nobody listens
    pub fn notify(&self, notification: Notification) {
        let _ = self.inner.notifications.send(notification);
    }
}

/// Handle to a running polling task
pub struct PollingHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel and wait for the task to exit
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Polling task ended abnormally: {}", e);
        }
    }
}

struct Worker {
    source: Arc<dyn RankingSource>,
    state: watch::Sender<DomainState>,
    requests: mpsc::UnboundedReceiver<RefreshRequest>,
    cancel: CancellationToken,
    notifications: broadcast::Sender<Notification>,
    count: RankingCount,
}

impl Worker {
    async fn run(mut self) {
        let domain = self.source.domain();

        loop {
            let first = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                request = self.requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let mut batch = vec![first];
            while !batch.is_empty() {
                let Some(outcome) = self.refresh(&batch).await else {
                    self.reject(batch, domain);
                    self.close(domain);
                    return;
                };

                for request in batch.drain(..) {
                    let _ = request.respond.send(Ok(outcome.clone()));
                }

                // Everything that queued up during the fetch shares one more
                while let Ok(request) = self.requests.try_recv() {
                    batch.push(request);
                }
                if batch.len() > 1 {
                    tracing::debug!("Coalesced {} {} refresh requests", batch.len(), domain);
                }
            }
        }

        self.close(domain);
    }

    /// Run one fetch for the batch; `None` when the section was closed mid-flight
    async fn refresh(&self, batch: &[RefreshRequest]) -> Option<RefreshOutcome> {
        let loud = batch.iter().any(|r| r.mode == RefreshMode::Loud);

        // Watchers only hear about the loading frame of a loud refresh
        self.state.send_if_modified(|state| {
            state.phase = RefreshPhase::Refreshing;
            if loud {
                state.loading = true;
            }
            loud
        });

        let fetch = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            fetch = fetch_rankings(self.source.as_ref(), self.count) => fetch,
        };

        let mut outcome = RefreshOutcome::new(self.source.domain());
        let mut published = false;
        self.state.send_if_modified(|state| {
            let previous = state.clone();
            outcome = state.apply(fetch, Utc::now());
            state.loading = false;
            state.phase = if outcome.all_failed() {
                RefreshPhase::Failed
            } else {
                RefreshPhase::Idle
            };
            published = loud || state.differs_from(&previous);
            published
        });

        if outcome.all_failed() {
            let message = self
                .state
                .borrow()
                .last_error
                .clone()
                .unwrap_or_else(|| "refresh failed".to_string());
            tracing::error!("Refresh of {} failed: {}", outcome.domain, message);
            let _ = self.notifications.send(Notification::error(
                outcome.domain,
                format!("Could not refresh: {}", message),
            ));
            self.state.send_if_modified(|state| {
                state.phase = RefreshPhase::Idle;
                published
            });
        } else if !outcome.is_complete() {
            let _ = self.notifications.send(Notification::warning(
                outcome.domain,
                format!("{} list(s) could not be refreshed", outcome.failed.len()),
            ));
        } else {
            tracing::trace!("Refreshed {}", outcome.domain);
        }

        Some(outcome)
    }

    fn reject(&mut self, batch: Vec<RefreshRequest>, domain: Domain) {
        for request in batch {
            let _ = request.respond.send(Err(AppError::SectionClosed(domain)));
        }
    }

    fn close(&mut self, domain: Domain) {
        self.requests.close();
        while let Ok(request) = self.requests.try_recv() {
            let _ = request.respond.send(Err(AppError::SectionClosed(domain)));
        }

        self.state.send_modify(|state| {
            state.loading = false;
            state.phase = RefreshPhase::Idle;
        });

        tracing::debug!("Refresh worker for {} stopped", domain);
    }
}
