//! Analytics backend access
//!
//! All indicator math, simulation and parameter search happen in the
//! backend. Pages talk to it through [`AnalyticsApi`] so tests can swap in
//! a fake.

pub mod client;
pub mod types;

use crate::error::Result;
use crate::optimize::OptimizationSpec;
use crate::strategy::{StrategyDescriptor, StrategyKind};
use async_trait::async_trait;

pub use client::HttpAnalyticsClient;
pub use types::*;

pub const DEFAULT_INTERVAL: &str = "1d";
pub const DEFAULT_RANGE: &str = "1y";

/// Operations offered by the analytics backend
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    /// Search instruments by symbol or name fragment
    async fn search_stocks(&self, query: &str) -> Result<Vec<StockSelection>>;

    /// Quote summary and price history
    async fn get_stock_data(&self, symbol: &str, interval: &str, range: &str) -> Result<StockData>;

    /// Simulate one strategy over the price history
    async fn run_backtest(
        &self,
        price_data: &[PriceBar],
        strategy: &StrategyDescriptor,
        initial_capital: f64,
    ) -> Result<BacktestResult>;

    /// Search the candidate grid for the best parameters
    async fn run_optimization(
        &self,
        price_data: &[PriceBar],
        kind: StrategyKind,
        optimization: &OptimizationSpec,
        initial_capital: f64,
    ) -> Result<OptimizationResult>;

    /// Compute indicator series; the response shape is backend-defined
    async fn calculate_indicators(
        &self,
        price_data: &[PriceBar],
        indicators: &[IndicatorRequest],
    ) -> Result<serde_json::Value>;
}
