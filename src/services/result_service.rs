//! Result Service
//!
//! Backtest result page: the stored result plus display summaries.

use crate::analytics::{BacktestResult, MonthlyReturn, StockSelection};
use crate::error::Result;
use crate::state::AppState;
use crate::strategy::StrategyDescriptor;
use serde::Serialize;
use tracing::info;

/// Trade and monthly figures derived from a result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultSummary {
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub realized_pnl: f64,
    pub positive_months: usize,
    pub negative_months: usize,
    pub best_month: Option<MonthlyReturn>,
    pub worst_month: Option<MonthlyReturn>,
}

impl ResultSummary {
    pub fn from_result(result: &BacktestResult) -> Self {
        let mut summary = ResultSummary {
            trade_count: result.trades.len(),
            ..Default::default()
        };

        for trade in &result.trades {
            summary.realized_pnl += trade.pnl;
            if trade.pnl > 0.0 {
                summary.winning_trades += 1;
            } else if trade.pnl < 0.0 {
                summary.losing_trades += 1;
            }
        }

        for month in &result.monthly_returns {
            if month.value > 0.0 {
                summary.positive_months += 1;
            } else if month.value < 0.0 {
                summary.negative_months += 1;
            }

            if summary.best_month.as_ref().map_or(true, |b| month.value > b.value) {
                summary.best_month = Some(month.clone());
            }
            if summary.worst_month.as_ref().map_or(true, |w| month.value < w.value) {
                summary.worst_month = Some(month.clone());
            }
        }

        summary
    }
}

/// Everything the result page shows
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage {
    pub result: BacktestResult,
    pub stock: Option<StockSelection>,
    pub strategy: Option<StrategyDescriptor>,
    pub strategy_name: Option<String>,
    /// One-line headline, e.g. `TSMC (2330.TW) - Moving Average Crossover`
    pub headline: String,
    pub summary: ResultSummary,
}

/// Result service for business logic
pub struct ResultService;

impl ResultService {
    /// Enter the result page
    pub fn activate(state: &AppState) -> Result<ResultPage> {
        let result = state.selection.require_backtest_result()?;
        let stock = state.selection.selected_stock();
        let strategy = state.selection.backtest_strategy();
        let strategy_name = strategy.as_ref().map(|s| s.kind().display_name().to_string());

        let headline = match (&stock, &strategy_name) {
            (Some(stock), Some(name)) => format!("{} - {}", stock.label(), name),
            (Some(stock), None) => stock.label(),
            (None, Some(name)) => name.clone(),
            (None, None) => "Backtest result".to_string(),
        };
        info!("ResultService::activate - {}", headline);

        Ok(ResultPage {
            summary: ResultSummary::from_result(&result),
            result,
            stock,
            strategy,
            strategy_name,
            headline,
        })
    }
}
