//! Application state management

use crate::analytics::{AnalyticsApi, HttpAnalyticsClient};
use crate::config::AppConfig;
use crate::db::{SqliteDb, StateStore};
use crate::error::Result;
use crate::requests::RequestTracker;
use crate::selection::SelectionState;
use std::sync::Arc;

/// Application state shared by all services and API handlers
pub struct AppState {
    pub config: AppConfig,

    /// Typed access to the persisted slots
    pub selection: SelectionState,

    /// Analytics backend
    pub analytics: Arc<dyn AnalyticsApi>,

    /// Per-operation request sequence numbers
    pub requests: RequestTracker,

    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Open the state database under the configured data dir and connect the backend client
    pub fn new(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let store = Arc::new(SqliteDb::new(&config.state_db_path())?);
        let analytics = Arc::new(HttpAnalyticsClient::new(&config.api_base_url, config.http_timeout)?);

        Ok(Self::with_parts(config, store, analytics))
    }

    /// Assemble state from explicit parts
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn StateStore>,
        analytics: Arc<dyn AnalyticsApi>,
    ) -> Self {
        Self {
            config,
            selection: SelectionState::new(store),
            analytics,
            requests: RequestTracker::new(),
            started_at: chrono::Utc::now(),
        }
    }
}
