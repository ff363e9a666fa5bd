//! Strategy Service
//!
//! Strategy page: load the selected stock's history, prefill optimized
//! parameters, and run backtests.

use crate::analytics::{
    BacktestResult, IndicatorRequest, StockData, StockSelection, DEFAULT_INTERVAL, DEFAULT_RANGE,
};
use crate::config::DEFAULT_INITIAL_CAPITAL;
use crate::error::{AppError, Result};
use crate::requests::Operation;
use crate::selection::Page;
use crate::services::load_stock_data;
use crate::state::AppState;
use crate::strategy::{ParamMap, StrategyDescriptor, StrategyKind};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the strategy page shows on entry
#[derive(Debug, Clone, Serialize)]
pub struct StrategyPage {
    pub stock: StockSelection,
    pub stock_data: StockData,
    /// Parameters carried over from an optimization run
    pub prefill: Option<ParamMap>,
    /// Strategy of the last backtest
    pub last_strategy: Option<StrategyDescriptor>,
}

/// Strategy form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyForm {
    #[serde(rename = "type")]
    pub kind: StrategyKind,
    #[serde(default)]
    pub params: ParamMap,
    #[serde(default)]
    pub initial_capital: Option<f64>,
}

impl StrategyForm {
    /// Descriptor with family defaults filled in
    pub fn descriptor(&self) -> Result<StrategyDescriptor> {
        StrategyDescriptor::from_params(self.kind, &self.params)
            .map_err(|e| AppError::Validation(format!("Invalid {} parameters: {}", self.kind, e)))
    }
}

/// Result of a backtest submission
#[derive(Debug, Clone, Serialize)]
pub struct BacktestOutcome {
    pub success: bool,
    pub strategy: StrategyDescriptor,
    pub result: BacktestResult,
    pub redirect: Page,
}

/// Strategy service for business logic
pub struct StrategyService;

impl StrategyService {
    /// Enter the strategy page
    pub async fn activate(state: &AppState) -> Result<StrategyPage> {
        let stock = state.selection.require_stock()?;
        info!("StrategyService::activate - {}", stock.symbol);

        state.selection.resume_editing();
        let stock_data = load_stock_data(state, &stock).await?;

        Ok(StrategyPage {
            stock,
            stock_data,
            prefill: state.selection.optimized_params(),
            last_strategy: state.selection.backtest_strategy(),
        })
    }

    /// Run a backtest and store its result
    pub async fn submit(state: &AppState, form: StrategyForm) -> Result<BacktestOutcome> {
        let stock = state.selection.require_stock()?;
        let strategy = form.descriptor()?;
        let initial_capital = Self::initial_capital(state, form.initial_capital)?;

        info!(
            "StrategyService::submit - {} {} ({})",
            stock.symbol,
            strategy.kind(),
            strategy.param_summary()
        );

        let ticket = state.requests.begin(Operation::Backtest);
        let stock_data = state
            .analytics
            .get_stock_data(&stock.symbol, DEFAULT_INTERVAL, DEFAULT_RANGE)
            .await?;
        if stock_data.price_data.is_empty() {
            return Err(AppError::Validation(format!(
                "No price data available for {}",
                stock.symbol
            )));
        }

        let result = state
            .analytics
            .run_backtest(&stock_data.price_data, &strategy, initial_capital)
            .await?;
        ticket.ensure_current()?;

        state.selection.record_backtest(&strategy, &result)?;
        info!(
            "StrategyService::submit - done, total return {:.4}, {} trades",
            result.performance_metrics.total_return,
            result.performance_metrics.total_trades
        );

        Ok(BacktestOutcome {
            success: true,
            strategy,
            result,
            redirect: Page::Result,
        })
    }

    /// Indicator series for the strategy on the form, for chart preview
    pub async fn preview_indicators(state: &AppState, form: &StrategyForm) -> Result<serde_json::Value> {
        let stock = state.selection.require_stock()?;
        let strategy = form.descriptor()?;

        let indicators: Vec<IndicatorRequest> = match &strategy {
            StrategyDescriptor::Multi(p) => p.indicators.iter().copied().map(IndicatorRequest::new).collect(),
            other => other
                .kind()
                .default_indicators()
                .iter()
                .copied()
                .map(IndicatorRequest::new)
                .collect(),
        };
        if indicators.is_empty() {
            return Err(AppError::Validation("No indicators selected".to_string()));
        }

        info!(
            "StrategyService::preview_indicators - {} indicators for {}",
            indicators.len(),
            stock.symbol
        );

        let ticket = state.requests.begin(Operation::Indicators);
        let stock_data = state
            .analytics
            .get_stock_data(&stock.symbol, DEFAULT_INTERVAL, DEFAULT_RANGE)
            .await?;
        let values = state
            .analytics
            .calculate_indicators(&stock_data.price_data, &indicators)
            .await?;
        ticket.ensure_current()?;

        Ok(values)
    }

    pub(crate) fn initial_capital(state: &AppState, requested: Option<f64>) -> Result<f64> {
        let capital = requested.unwrap_or(state.config.initial_capital);
        if !capital.is_finite() || capital <= 0.0 {
            return Err(AppError::Validation(format!(
                "Initial capital must be positive, got {}",
                capital
            )));
        }
        Ok(capital)
    }
}

impl Default for StrategyForm {
    fn default() -> Self {
        Self {
            kind: StrategyKind::MaCross,
            params: ParamMap::new(),
            initial_capital: Some(DEFAULT_INITIAL_CAPITAL),
        }
    }
}
