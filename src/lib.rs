//! TW Backtest Desktop - Stock Strategy Backtesting Client
//!
//! Desktop-side core for selecting a stock, configuring a technical
//! indicator strategy, optimizing its parameters and reviewing backtest
//! results. Indicator math and simulation run in the analytics backend;
//! this crate keeps the cross-page state, shapes backend requests and
//! serves the page operations to the UI shell over a local HTTP API.

pub mod analytics;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod optimize;
pub mod requests;
pub mod selection;
pub mod services;
pub mod state;
pub mod strategy;

use api::ApiServer;
use config::AppConfig;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging, open state and serve the local API until Ctrl+C
pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twbacktest_desktop=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TW Backtest Desktop...");

    let config = AppConfig::from_env()?;
    let app_state = Arc::new(AppState::new(config)?);
    tracing::info!(
        "Application state initialized (stage {:?})",
        app_state.selection.stage()
    );

    let mut server = ApiServer::new(app_state);
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    server.stop();

    Ok(())
}
