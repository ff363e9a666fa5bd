//! Analytics backend wire types
//!
//! Results are treated as pass-through: the fields the app reads are typed,
//! anything else the backend sends is kept in `extra` so persisted results
//! round-trip unchanged.

use crate::optimize::OptimizationSpec;
use crate::strategy::{IndicatorKind, ParamMap, StrategyDescriptor, StrategyRef};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a value that could be an integer, a float or a numeric string
fn deserialize_flexible_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleInt {
        Int(i64),
        Float(f64),
        Str(String),
    }

    match FlexibleInt::deserialize(deserializer)? {
        FlexibleInt::Int(i) => Ok(i),
        FlexibleInt::Float(f) => Ok(f as i64),
        FlexibleInt::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Stocks
// ============================================================================

/// One tradable instrument, as listed by stock search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSelection {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

impl StockSelection {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            exchange: None,
            industry: None,
        }
    }

    /// `name (symbol)`, or just the symbol when unnamed
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.symbol),
            None => self.symbol.clone(),
        }
    }
}

/// Quote summary returned with price data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "regularMarketPrice", default)]
    pub regular_market_price: Option<f64>,
    #[serde(rename = "previousClose", default)]
    pub previous_close: Option<f64>,
}

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(deserialize_with = "deserialize_flexible_i64")]
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    pub stock_info: StockInfo,
    #[serde(default)]
    pub price_data: Vec<PriceBar>,
}

// ============================================================================
// Backtest
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    #[serde(deserialize_with = "deserialize_flexible_i64")]
    pub total_trades: i64,
}

/// One trade record; `side` carries the backend's buy/sell label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub side: String,
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_flexible_i64")]
    pub shares: i64,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub month: String,
    #[serde(rename = "return")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: String,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub performance_metrics: PerformanceMetrics,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    #[serde(default)]
    pub monthly_returns: Vec<MonthlyReturn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equity_curve: Vec<EquityPoint>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Optimization
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRow {
    pub params: ParamMap,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    #[serde(default)]
    pub best_params: ParamMap,
    #[serde(default)]
    pub results: Vec<OptimizationRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_metric_value: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Indicators
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    #[serde(rename = "type")]
    pub kind: IndicatorKind,
    #[serde(default)]
    pub params: ParamMap,
}

impl IndicatorRequest {
    pub fn new(kind: IndicatorKind) -> Self {
        Self {
            kind,
            params: ParamMap::new(),
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct BacktestBody<'a> {
    pub price_data: &'a [PriceBar],
    pub strategy: &'a StrategyDescriptor,
    pub initial_capital: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptimizeBody<'a> {
    pub price_data: &'a [PriceBar],
    pub strategy: StrategyRef,
    pub optimization: &'a OptimizationSpec,
    pub initial_capital: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct IndicatorsBody<'a> {
    pub price_data: &'a [PriceBar],
    pub indicators: &'a [IndicatorRequest],
}

/// Error payload of a non-success backend response
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
