//! HTTP client for the analytics backend REST API

use crate::analytics::types::*;
use crate::analytics::AnalyticsApi;
use crate::error::{AppError, Result};
use crate::optimize::OptimizationSpec;
use crate::strategy::{StrategyDescriptor, StrategyKind, StrategyRef};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// reqwest-backed [`AnalyticsApi`]
pub struct HttpAnalyticsClient {
    client: Client,
    base_url: String,
}

impl HttpAnalyticsClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a success body, or turn the backend's `{"error": ...}` into an error
    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("request failed").to_string()
                    } else {
                        body
                    }
                });

            error!("Backend {} failed with {}: {}", path, status, message);
            return Err(AppError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&null_non_finite(&body)).map_err(|e| {
            error!("Backend {} returned an unreadable body: {}", path, e);
            AppError::Backend {
                status: status.as_u16(),
                message: format!("Invalid response from {}: {}", path, e),
            }
        })
    }
}

/// Replace the bare `NaN`, `Infinity` and `-Infinity` tokens the backend's
/// JSON encoder emits for non-finite floats with `null`. String contents
/// are left untouched.
fn null_non_finite(body: &str) -> Cow<'_, str> {
    if !body.contains("NaN") && !body.contains("Infinity") {
        return Cow::Borrowed(body);
    }

    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(*t))
        {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

#[async_trait]
impl AnalyticsApi for HttpAnalyticsClient {
    async fn search_stocks(&self, query: &str) -> Result<Vec<StockSelection>> {
        let path = "/api/stocks/search";
        debug!("GET {} query={}", path, query);

        let response = self
            .client
            .get(self.url(path))
            .query(&[("query", query)])
            .send()
            .await?;

        Self::decode(path, response).await
    }

    async fn get_stock_data(&self, symbol: &str, interval: &str, range: &str) -> Result<StockData> {
        let path = "/api/stocks/data";
        debug!("GET {} symbol={} interval={} range={}", path, symbol, interval, range);

        let response = self
            .client
            .get(self.url(path))
            .query(&[("symbol", symbol), ("interval", interval), ("range", range)])
            .send()
            .await?;

        Self::decode(path, response).await
    }

    async fn run_backtest(
        &self,
        price_data: &[PriceBar],
        strategy: &StrategyDescriptor,
        initial_capital: f64,
    ) -> Result<BacktestResult> {
        let path = "/api/backtest/run";
        debug!("POST {} strategy={} bars={}", path, strategy.kind(), price_data.len());

        let body = BacktestBody {
            price_data,
            strategy,
            initial_capital,
        };
        let response = self.client.post(self.url(path)).json(&body).send().await?;

        Self::decode(path, response).await
    }

    async fn run_optimization(
        &self,
        price_data: &[PriceBar],
        kind: StrategyKind,
        optimization: &OptimizationSpec,
        initial_capital: f64,
    ) -> Result<OptimizationResult> {
        let path = "/api/optimize/run";
        debug!(
            "POST {} strategy={} combinations={}",
            path,
            kind,
            optimization.param_ranges.combination_count()
        );

        let body = OptimizeBody {
            price_data,
            strategy: StrategyRef { kind },
            optimization,
            initial_capital,
        };
        let response = self.client.post(self.url(path)).json(&body).send().await?;

        Self::decode(path, response).await
    }

    async fn calculate_indicators(
        &self,
        price_data: &[PriceBar],
        indicators: &[IndicatorRequest],
    ) -> Result<serde_json::Value> {
        let path = "/api/indicators/calculate";
        debug!("POST {} indicators={}", path, indicators.len());

        let body = IndicatorsBody {
            price_data,
            indicators,
        };
        let response = self.client.post(self.url(path)).json(&body).send().await?;

        Self::decode(path, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::{build, OptimizationMethod, ParameterRanges, TargetMetric};
    use crate::strategy::IndicatorKind;
    use axum::{
        extract::{Json, Query},
        http::{header, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// In-process stand-in for the analytics backend
    async fn spawn_backend() -> Url {
        let app = Router::new()
            .route(
                "/api/stocks/search",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let query = q.get("query").cloned().unwrap_or_default();
                    Json(json!([
                        {"symbol": "2330.TW", "name": "TSMC", "exchange": "TAI", "industry": query}
                    ]))
                }),
            )
            .route(
                "/api/stocks/data",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let symbol = q.get("symbol").cloned().unwrap_or_default();
                    let exchange = format!(
                        "{}/{}",
                        q.get("interval").cloned().unwrap_or_default(),
                        q.get("range").cloned().unwrap_or_default()
                    );
                    Json(json!({
                        "stock_info": {"symbol": symbol, "exchange": exchange, "currency": "TWD"},
                        "price_data": [
                            {"date": "2024-01-02", "open": 1.0, "high": 1.2, "low": 0.9, "close": 1.1, "volume": 1000}
                        ]
                    }))
                }),
            )
            .route(
                "/api/backtest/run",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "performance_metrics": {
                            "total_return": 0.1,
                            "annualized_return": 0.1,
                            "sharpe_ratio": 1.0,
                            "max_drawdown": -0.05,
                            "win_rate": 0.6,
                            "total_trades": body["price_data"].as_array().map(|a| a.len()).unwrap_or(0)
                        },
                        "trades": [],
                        "monthly_returns": [],
                        "strategy_echo": body["strategy"].clone(),
                        "capital_echo": body["initial_capital"].clone()
                    }))
                }),
            )
            .route(
                "/api/optimize/run",
                post(|Json(body): Json<Value>| async move {
                    if body["optimization"]["param_ranges"].as_object().map_or(true, |m| m.is_empty()) {
                        return (StatusCode::BAD_REQUEST, Json(json!({"error": "no parameter ranges"})))
                            .into_response();
                    }
                    if body["optimization"]["target_metric"] == "drawdown" {
                        // Every combination skipped: the best value never left -inf
                        return (
                            [(header::CONTENT_TYPE, "application/json")],
                            r#"{"best_metric_value": -Infinity, "best_params": {}, "results": [], "target_metric": "max_drawdown", "note": "NaN stays text"}"#,
                        )
                            .into_response();
                    }
                    Json(json!({
                        "best_params": {"short": 5, "long": 20},
                        "results": [],
                        "method_echo": body["optimization"]["method"].clone(),
                        "type_echo": body["strategy"]["type"].clone()
                    }))
                    .into_response()
                }),
            )
            .route(
                "/api/indicators/calculate",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Url::parse(&format!("http://{}/", addr)).unwrap()
    }

    fn bars() -> Vec<PriceBar> {
        vec![PriceBar {
            date: "2024-01-02".to_string(),
            open: 1.0,
            high: 1.2,
            low: 0.9,
            close: 1.1,
            volume: 1000,
        }]
    }

    async fn client() -> HttpAnalyticsClient {
        let base = spawn_backend().await;
        HttpAnalyticsClient::new(&base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_search_sends_query() {
        let client = client().await;
        let results = client.search_stocks("2330").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "2330.TW");
        assert_eq!(results[0].industry.as_deref(), Some("2330"));
    }

    #[tokio::test]
    async fn test_stock_data_sends_interval_and_range() {
        let client = client().await;
        let data = client.get_stock_data("2330.TW", "1d", "1y").await.unwrap();

        assert_eq!(data.stock_info.symbol, "2330.TW");
        assert_eq!(data.stock_info.exchange.as_deref(), Some("1d/1y"));
        assert_eq!(data.price_data.len(), 1);
    }

    #[tokio::test]
    async fn test_backtest_body_shape() {
        let client = client().await;
        let result = client
            .run_backtest(&bars(), &StrategyDescriptor::default(), 500_000.0)
            .await
            .unwrap();

        assert_eq!(result.performance_metrics.total_trades, 1);
        assert_eq!(result.extra["strategy_echo"], json!({"type": "ma_cross", "params": {"short": 5, "long": 20}}));
        assert_eq!(result.extra["capital_echo"], 500_000.0);
    }

    #[tokio::test]
    async fn test_optimization_body_shape() {
        let client = client().await;
        let spec = OptimizationSpec {
            method: OptimizationMethod::Genetic,
            target_metric: TargetMetric::Sharpe,
            param_ranges: build(StrategyKind::MaCross, &ParameterRanges::default()),
        };
        let result = client
            .run_optimization(&bars(), StrategyKind::MaCross, &spec, 1_000_000.0)
            .await
            .unwrap();

        assert_eq!(result.best_params["short"], 5);
        assert_eq!(result.extra["method_echo"], "genetic");
        assert_eq!(result.extra["type_echo"], "ma_cross");
    }

    #[tokio::test]
    async fn test_non_finite_best_metric_reads_as_none() {
        let client = client().await;
        let spec = OptimizationSpec {
            method: OptimizationMethod::Grid,
            target_metric: TargetMetric::Drawdown,
            param_ranges: build(StrategyKind::MaCross, &ParameterRanges::default()),
        };
        let result = client
            .run_optimization(&bars(), StrategyKind::MaCross, &spec, 1_000_000.0)
            .await
            .unwrap();

        assert_eq!(result.best_metric_value, None);
        assert!(result.best_params.is_empty());
        assert!(result.results.is_empty());
        assert_eq!(result.target_metric.as_deref(), Some("max_drawdown"));
        assert_eq!(result.extra["note"], "NaN stays text");
    }

    #[test]
    fn test_null_non_finite() {
        assert!(matches!(null_non_finite(r#"{"a": 1.5}"#), Cow::Borrowed(_)));
        assert_eq!(
            null_non_finite(r#"{"a": -Infinity, "b": [NaN, Infinity], "c": "-Infinity \"NaN\""}"#),
            r#"{"a": null, "b": [null, null], "c": "-Infinity \"NaN\""}"#
        );
    }

    #[tokio::test]
    async fn test_backend_error_message_surfaced() {
        let client = client().await;
        let spec = OptimizationSpec {
            method: OptimizationMethod::Grid,
            target_metric: TargetMetric::Sharpe,
            param_ranges: build(StrategyKind::Bollinger, &ParameterRanges::default()),
        };
        let err = client
            .run_optimization(&bars(), StrategyKind::Bollinger, &spec, 1_000_000.0)
            .await
            .unwrap_err();

        match err {
            AppError::Backend { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "no parameter ranges");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_error_body_uses_status_reason() {
        let client = client().await;
        let err = client
            .calculate_indicators(&bars(), &[IndicatorRequest::new(IndicatorKind::Rsi)])
            .await
            .unwrap_err();

        match err {
            AppError::Backend { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let client = HttpAnalyticsClient::new(&base, Duration::from_millis(500)).unwrap();
        let err = client.search_stocks("x").await.unwrap_err();
        assert!(matches!(err, AppError::Http(_)));
    }
}
