//! Shared application state for the Axum server.

use std::sync::Arc;

use courier_common::config::AppConfig;

use crate::gateway::TriggerGateway;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<TriggerGateway>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(gateway: TriggerGateway, config: AppConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            config,
        }
    }
}
