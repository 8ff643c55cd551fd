//! Services module
//!
//! Everything between the console commands and the remote APIs: the
//! bootstrap configuration, the typed API clients, the usage classifier,
//! the presentation adapter and the refresh coordinator.

pub mod adapter;
pub mod classifier;
pub mod client;
pub mod config_service;
pub mod coordinator;
pub mod ranking;

pub use adapter::{format_last_used, DisplayRecord, Payload, Present};
pub use classifier::{classify, Gesture, SecretField, UsageClass};
pub use client::{build_http_client, CredentialsClient, LinksClient, NotesClient, ResourceClient};
pub use config_service::{ConfigHandle, ConfigService};
pub use coordinator::{
    GestureOutcome, Notification, NotificationLevel, PollingHandle, RefreshCoordinator,
    RefreshMode,
};
pub use ranking::{
    DomainState, RankingCount, RankingCriterion, RankingSnapshot, RankingSource, RefreshOutcome,
    RefreshPhase,
};
