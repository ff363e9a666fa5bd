//! Optimization Service
//!
//! Parameter optimization page: expands the form's ranges into candidate
//! values, runs the backend optimizer and carries the chosen parameters
//! back to strategy configuration.

use crate::analytics::{OptimizationResult, StockData, StockSelection, DEFAULT_INTERVAL, DEFAULT_RANGE};
use crate::error::{AppError, Result};
use crate::optimize::{
    build, is_optimizable, out_of_ui_bounds, validate, OptimizationMethod, OptimizationSpec, ParameterRanges,
    RangeIssue, TargetMetric,
};
use crate::requests::Operation;
use crate::selection::{OptimizedStrategy, Page};
use crate::services::load_stock_data;
use crate::services::StrategyService;
use crate::state::AppState;
use crate::strategy::{ParamMap, StrategyKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Everything the optimization page shows on entry
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationPage {
    pub stock: StockSelection,
    pub stock_data: StockData,
    /// Families with optimizable parameters
    pub optimizable: Vec<StrategyKind>,
    pub last_optimization: Option<OptimizedStrategy>,
}

/// Optimization form submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationForm {
    #[serde(rename = "type")]
    pub kind: Option<StrategyKind>,
    #[serde(default)]
    pub method: OptimizationMethod,
    #[serde(default)]
    pub target_metric: TargetMetric,
    #[serde(default)]
    pub ranges: ParameterRanges,
    #[serde(default)]
    pub initial_capital: Option<f64>,
}

/// Result of an optimization run
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    pub success: bool,
    pub strategy: OptimizedStrategy,
    /// Number of parameter combinations submitted
    pub combinations: usize,
    /// Range problems found before submitting; the run still goes ahead
    pub warnings: Vec<RangeIssue>,
    pub result: OptimizationResult,
}

/// Result of applying chosen parameters
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub success: bool,
    pub params: ParamMap,
    pub redirect: Page,
}

/// Optimization service for business logic
pub struct OptimizationService;

impl OptimizationService {
    /// Enter the optimization page
    pub async fn activate(state: &AppState) -> Result<OptimizationPage> {
        let stock = state.selection.require_stock()?;
        info!("OptimizationService::activate - {}", stock.symbol);

        let stock_data = load_stock_data(state, &stock).await?;

        Ok(OptimizationPage {
            stock,
            stock_data,
            optimizable: StrategyKind::ALL
                .into_iter()
                .filter(|k| is_optimizable(*k))
                .collect(),
            last_optimization: state.selection.optimization_strategy(),
        })
    }

    /// Run the optimizer and store the best parameters
    pub async fn submit(state: &AppState, form: OptimizationForm) -> Result<OptimizationOutcome> {
        let stock = state.selection.require_stock()?;
        let kind = form
            .kind
            .ok_or_else(|| AppError::Validation("Please choose a strategy".to_string()))?;
        if !is_optimizable(kind) {
            return Err(AppError::Validation(format!(
                "{} has no optimizable parameters",
                kind.display_name()
            )));
        }
        let initial_capital = StrategyService::initial_capital(state, form.initial_capital)?;

        if let Some(issue) = out_of_ui_bounds(kind, &form.ranges).into_iter().next() {
            warn!("OptimizationService::submit - rejected range: {}", issue.message);
            return Err(AppError::Validation(issue.message));
        }

        let warnings = validate(kind, &form.ranges);
        for issue in &warnings {
            warn!("Optimization range {}: {}", issue.param, issue.message);
        }

        let spec = OptimizationSpec {
            method: form.method,
            target_metric: form.target_metric,
            param_ranges: build(kind, &form.ranges),
        };
        let combinations = spec.param_ranges.combination_count();
        info!(
            "OptimizationService::submit - {} {} {:?}/{:?}, {} combinations",
            stock.symbol, kind, spec.method, spec.target_metric, combinations
        );

        let ticket = state.requests.begin(Operation::Optimization);
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
            .run_optimization(&stock_data.price_data, kind, &spec, initial_capital)
            .await?;
        ticket.ensure_current()?;

        state.selection.record_optimization(kind, &result)?;
        info!(
            "OptimizationService::submit - best params {:?} ({} rows)",
            result.best_params,
            result.results.len()
        );

        Ok(OptimizationOutcome {
            success: true,
            strategy: OptimizedStrategy {
                kind,
                params: result.best_params.clone(),
            },
            combinations,
            warnings,
            result,
        })
    }

    /// Carry `params` (best or hand-picked) back to the strategy page
    pub fn apply(state: &AppState, params: ParamMap) -> Result<ApplyOutcome> {
        state.selection.require_stock()?;
        if params.is_empty() {
            return Err(AppError::Validation("No parameters to apply".to_string()));
        }

        info!("OptimizationService::apply - {} params", params.len());
        state.selection.apply_params(&params)?;

        Ok(ApplyOutcome {
            success: true,
            params,
            redirect: Page::Strategy,
        })
    }
}
