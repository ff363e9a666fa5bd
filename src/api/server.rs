//! HTTP server for the local page API

use crate::api::handlers;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    // Allow all origins for the local UI shell
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ================================================================
        // Health check / session
        // ================================================================
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))
        .route(
            "/api/state",
            get(handlers::get_session).delete(handlers::clear_session),
        )

        // ================================================================
        // Stock page
        // ================================================================
        .route("/api/stocks/search", get(handlers::search_stocks))
        .route(
            "/api/stock",
            get(handlers::get_stock).post(handlers::select_stock),
        )

        // ================================================================
        // Strategy page
        // ================================================================
        .route("/api/strategy", get(handlers::activate_strategy))
        .route("/api/strategy/backtest", post(handlers::run_backtest))
        .route("/api/strategy/indicators", post(handlers::preview_indicators))

        // ================================================================
        // Optimization page
        // ================================================================
        .route("/api/optimize", get(handlers::activate_optimization))
        .route("/api/optimize/run", post(handlers::run_optimization))
        .route("/api/optimize/apply", post(handlers::apply_params))

        // ================================================================
        // Result page
        // ================================================================
        .route("/api/result", get(handlers::activate_result))

        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Local API server manager
pub struct ApiServer {
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
        }
    }

    /// Bind the configured address and serve in a background task.
    ///
    /// Returns the bound address (useful when the configured port is 0).
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let bind = self.state.config.bind_address();
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address {}: {}", bind, e)))?;

        let app = router(self.state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        });

        info!("Backtest desktop API server listening on http://{}", local_addr);
        info!("Analytics backend: {}", self.state.config.api_base_url);

        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::MemoryStore;
    use crate::services::testing::FakeAnalytics;
    use serde_json::{json, Value};

    async fn start(fake: Arc<FakeAnalytics>) -> (ApiServer, String) {
        let mut config = AppConfig::default();
        config.port = 0;
        let state = Arc::new(AppState::with_parts(config, Arc::new(MemoryStore::new()), fake));

        let mut server = ApiServer::new(state);
        let addr = server.start().await.unwrap();
        (server, format!("http://{}", addr))
    }

    #[tokio::test]
    async fn test_precondition_maps_to_412_with_redirect() {
        let fake = Arc::new(FakeAnalytics::default());
        let (_server, base) = start(fake.clone()).await;

        let response = reqwest::get(format!("{}/api/strategy", base)).await.unwrap();
        assert_eq!(response.status(), 412);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "PRECONDITION_FAILED");
        assert_eq!(body["redirect"], "/stock");
        assert_eq!(fake.calls(), 0);

        let response = reqwest::get(format!("{}/api/result", base)).await.unwrap();
        assert_eq!(response.status(), 412);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["redirect"], "/strategy");
    }

    #[tokio::test]
    async fn test_blank_search_is_400() {
        let (_server, base) = start(Arc::new(FakeAnalytics::default())).await;

        let response = reqwest::get(format!("{}/api/stocks/search?query=", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_select_then_backtest_flow() {
        let (_server, base) = start(Arc::new(FakeAnalytics::default())).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/stock", base))
            .json(&json!({"symbol": "2330.TW", "name": "TSMC"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = client
            .post(format!("{}/api/strategy/backtest", base))
            .json(&json!({"type": "rsi", "params": {"period": 10}}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["redirect"], "/result");
        assert_eq!(
            body["data"]["strategy"],
            json!({"type": "rsi", "params": {"period": 10, "overbought": 70.0, "oversold": 30.0}})
        );

        let session: Value = client
            .get(format!("{}/api/state", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(session["data"]["stage"], "result_available");
        assert_eq!(session["data"]["has_result"], true);

        let result: Value = client
            .get(format!("{}/api/result", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(result["data"]["strategy_name"], "RSI Overbought/Oversold");
    }

    #[tokio::test]
    async fn test_stop() {
        let (mut server, _base) = start(Arc::new(FakeAnalytics::default())).await;
        assert!(server.is_running());
        server.stop();
        assert!(!server.is_running());
    }
}
