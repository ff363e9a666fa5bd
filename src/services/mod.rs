//! Services Layer
//!
//! Page-level business logic, called by the local API handlers.
//!
//! # Architecture
//!
//! ```text
//! UI shell --> Local API ──> Services ──┬──> SelectionState --> StateStore
//!                                       └──> AnalyticsApi   --> backend
//! ```
//!
//! # Services
//!
//! - `StockService` - Stock search and selection
//! - `StrategyService` - Strategy configuration and backtest submission
//! - `OptimizationService` - Parameter optimization and applying results
//! - `ResultService` - Backtest result display

pub mod stock_service;
pub mod strategy_service;
pub mod optimization_service;
pub mod result_service;

pub use stock_service::{StockService, StockSelectResult};
pub use strategy_service::{BacktestOutcome, StrategyForm, StrategyPage, StrategyService};
pub use optimization_service::{
    ApplyOutcome, OptimizationForm, OptimizationOutcome, OptimizationPage, OptimizationService,
};
pub use result_service::{ResultPage, ResultService, ResultSummary};

use crate::analytics::{StockData, StockSelection, DEFAULT_INTERVAL, DEFAULT_RANGE};
use crate::error::Result;
use crate::requests::Operation;
use crate::state::AppState;

/// Fetch price history for the selected stock, as the latest stock-data request
async fn load_stock_data(state: &AppState, stock: &StockSelection) -> Result<StockData> {
    let ticket = state.requests.begin(Operation::StockData);
    let data = state
        .analytics
        .get_stock_data(&stock.symbol, DEFAULT_INTERVAL, DEFAULT_RANGE)
        .await?;
    ticket.ensure_current()?;
    Ok(data)
}
