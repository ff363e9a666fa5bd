//! Local API endpoint handlers
//!
//! Thin wrappers that hand each request to the matching page service and
//! wrap the outcome in an [`ApiResponse`].

use crate::analytics::StockSelection;
use crate::api::types::*;
use crate::error::AppError;
use crate::services::{
    ApplyOutcome, BacktestOutcome, OptimizationForm, OptimizationOutcome, OptimizationPage,
    OptimizationService, ResultPage, ResultService, StockSelectResult, StockService, StrategyForm,
    StrategyPage, StrategyService,
};
use crate::state::AppState;
use axum::extract::{Json, Query, State as AxumState};
use std::sync::Arc;
use tracing::info;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn ok<T: serde::Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success_with_data(data)))
}

// ============================================================================
// Health Check / Session
// ============================================================================

pub async fn health_check() -> Json<ApiResponse<Empty>> {
    Json(ApiResponse::success_with_message("Backtest desktop API is running"))
}

/// GET /api/state
pub async fn get_session(AxumState(state): AxumState<Arc<AppState>>) -> ApiResult<SessionState> {
    let optimized_params = state.selection.optimized_params();

    ok(SessionState {
        stage: state.selection.stage(),
        selected_stock: state.selection.selected_stock(),
        has_result: state.selection.backtest_result().is_some(),
        optimized_params,
        loading: state.requests.loading(),
        started_at: state.started_at,
    })
}

/// DELETE /api/state
pub async fn clear_session(AxumState(state): AxumState<Arc<AppState>>) -> ApiResult<Empty> {
    info!("Clearing session state");
    state.selection.clear_all()?;
    Ok(Json(ApiResponse::success_with_message("Session state cleared")))
}

// ============================================================================
// Stock Page
// ============================================================================

/// GET /api/stocks/search?query=
pub async fn search_stocks(
    AxumState(state): AxumState<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Vec<StockSelection>> {
    let results = StockService::search(&state, &params.query).await?;
    let message = if results.is_empty() {
        Some("No matching stocks found, try another keyword".to_string())
    } else {
        None
    };

    let mut response = ApiResponse::success_with_data(results);
    response.message = message;
    Ok(Json(response))
}

/// GET /api/stock
pub async fn get_stock(
    AxumState(state): AxumState<Arc<AppState>>,
) -> ApiResult<Option<StockSelection>> {
    ok(StockService::current(&state))
}

/// POST /api/stock
pub async fn select_stock(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(stock): Json<StockSelection>,
) -> ApiResult<StockSelectResult> {
    let result = StockService::select(&state, stock)?;
    let mut response = ApiResponse::success_with_data(result);
    response.message = response.data.as_ref().map(|r| r.message.clone());
    Ok(Json(response))
}

// ============================================================================
// Strategy Page
// ============================================================================

/// GET /api/strategy
pub async fn activate_strategy(
    AxumState(state): AxumState<Arc<AppState>>,
) -> ApiResult<StrategyPage> {
    ok(StrategyService::activate(&state).await?)
}

/// POST /api/strategy/backtest
pub async fn run_backtest(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(form): Json<StrategyForm>,
) -> ApiResult<BacktestOutcome> {
    let outcome = StrategyService::submit(&state, form).await?;
    let redirect = outcome.redirect;
    Ok(Json(ApiResponse::success_with_data(outcome).with_redirect(redirect.path())))
}

/// POST /api/strategy/indicators
pub async fn preview_indicators(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(form): Json<StrategyForm>,
) -> ApiResult<serde_json::Value> {
    ok(StrategyService::preview_indicators(&state, &form).await?)
}

// ============================================================================
// Optimization Page
// ============================================================================

/// GET /api/optimize
pub async fn activate_optimization(
    AxumState(state): AxumState<Arc<AppState>>,
) -> ApiResult<OptimizationPage> {
    ok(OptimizationService::activate(&state).await?)
}

/// POST /api/optimize/run
pub async fn run_optimization(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(form): Json<OptimizationForm>,
) -> ApiResult<OptimizationOutcome> {
    ok(OptimizationService::submit(&state, form).await?)
}

/// POST /api/optimize/apply
pub async fn apply_params(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(request): Json<ApplyParamsRequest>,
) -> ApiResult<ApplyOutcome> {
    let outcome = OptimizationService::apply(&state, request.params)?;
    let redirect = outcome.redirect;
    Ok(Json(ApiResponse::success_with_data(outcome).with_redirect(redirect.path())))
}

// ============================================================================
// Result Page
// ============================================================================

/// GET /api/result
pub async fn activate_result(AxumState(state): AxumState<Arc<AppState>>) -> ApiResult<ResultPage> {
    ok(ResultService::activate(&state)?)
}
