//! Dashboard commands
//!
//! `dashboard` performs one loud refresh of every section and returns the
//! published states. `watch` keeps polling and reprints whenever a section
//! publishes a new state.

use super::render;
use crate::app::AppState;
use crate::error::Result;
use crate::models::Domain;
use crate::services::coordinator::RefreshMode;
use crate::services::ranking::DomainState;
use chrono::Utc;
use futures::future::select_all;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Refresh every section and return the resulting states
pub async fn dashboard(state: &AppState) -> Vec<DomainState> {
    for (domain, result) in state.coordinator.refresh_all(RefreshMode::Loud).await {
        if let Err(e) = result {
            tracing::warn!("Dashboard refresh of {} failed: {}", domain, e);
        }
    }

    current_states(state)
}

fn current_states(state: &AppState) -> Vec<DomainState> {
    Domain::ALL
        .iter()
        .filter_map(|domain| state.coordinator.snapshot(*domain))
        .collect()
}

/// Poll every `interval` and print the dashboard on every change until Ctrl-C
pub async fn watch(state: &AppState, interval: Duration) -> Result<()> {
    let mut receivers: Vec<_> = Domain::ALL
        .iter()
        .filter_map(|domain| state.coordinator.subscribe(*domain))
        .collect();
    if receivers.is_empty() {
        return Ok(());
    }
    let mut notifications = state.coordinator.subscribe_notifications();

    let polling = state.coordinator.start_polling(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let changed = select_all(receivers.iter_mut().map(|rx| Box::pin(rx.changed())));

        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            notification = notifications.recv() => match notification {
                Ok(notification) => eprintln!("{}", notification),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} notifications", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            (result, _, _) = changed => {
                if result.is_err() {
                    break;
                }
                let states = current_states(state);
                // Skip the intermediate loading frame
                if states.iter().any(|s| s.loading) {
                    continue;
                }
                println!("{}\n", render::dashboard(&states, Utc::now()));
            }
        }
    }

    tracing::info!("Stopping watch");
    polling.stop().await;
    state.coordinator.shutdown();
    Ok(())
}
