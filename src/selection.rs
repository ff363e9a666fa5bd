//! Selection state coordination
//!
//! [`SelectionState`] is the only read/write path for cross-page state. It
//! types the raw slots of a [`StateStore`], enforces the navigation
//! preconditions of each page and tracks where the session is in the
//! select → configure → run workflow.

use crate::analytics::{BacktestResult, OptimizationResult, StockSelection};
use crate::db::{Slot, StateStore};
use crate::error::{AppError, Result};
use crate::strategy::{ParamMap, StrategyDescriptor, StrategyKind};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// UI pages, used as redirect targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    StockSelect,
    Strategy,
    Optimize,
    Result,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::StockSelect => "/stock",
            Page::Strategy => "/strategy",
            Page::Optimize => "/optimize",
            Page::Result => "/result",
        }
    }
}

/// Where the session is in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    NoStock,
    StockSelected,
    ResultAvailable,
    ParamsOptimized,
}

/// Contents of the `optimizationStrategy` slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedStrategy {
    #[serde(rename = "type")]
    pub kind: StrategyKind,
    #[serde(default)]
    pub params: ParamMap,
}

pub struct SelectionState {
    store: Arc<dyn StateStore>,
    stage: RwLock<WorkflowStage>,
}

impl SelectionState {
    /// Wrap `store`; the session resumes at `StockSelected` if a stock is persisted
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let state = Self {
            store,
            stage: RwLock::new(WorkflowStage::NoStock),
        };

        if state.selected_stock().is_some() {
            *state.stage.write() = WorkflowStage::StockSelected;
        }

        state
    }

    pub fn stage(&self) -> WorkflowStage {
        *self.stage.read()
    }

    fn set_stage(&self, next: WorkflowStage) {
        let mut stage = self.stage.write();
        if *stage != next {
            info!("Workflow stage {:?} -> {:?}", *stage, next);
            *stage = next;
        }
    }

    // ========== Slot access ==========

    /// Read a slot. Unreadable or undeserializable values are absent.
    pub fn get<T: DeserializeOwned>(&self, slot: Slot) -> Option<T> {
        let raw = match self.store.get(slot) {
            Ok(raw) => raw?,
            Err(e) => {
                error!("Failed to read slot {}: {}", slot, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt value in slot {}: {}", slot, e);
                None
            }
        }
    }

    /// Replace the whole value of a slot
    pub fn put<T: Serialize + ?Sized>(&self, slot: Slot, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.put(slot, &raw)
    }

    pub fn clear(&self, slot: Slot) -> Result<()> {
        self.store.remove(slot)?;
        if slot == Slot::SelectedStock {
            self.set_stage(WorkflowStage::NoStock);
        }
        Ok(())
    }

    /// Drop every slot, used when the stored format changes
    pub fn clear_all(&self) -> Result<()> {
        self.store.clear()?;
        self.set_stage(WorkflowStage::NoStock);
        info!("Cleared all selection state");
        Ok(())
    }

    pub fn selected_stock(&self) -> Option<StockSelection> {
        self.get(Slot::SelectedStock)
    }

    pub fn backtest_result(&self) -> Option<BacktestResult> {
        self.get(Slot::BacktestResult)
    }

    pub fn backtest_strategy(&self) -> Option<StrategyDescriptor> {
        self.get(Slot::BacktestStrategy)
    }

    pub fn optimization_strategy(&self) -> Option<OptimizedStrategy> {
        self.get(Slot::OptimizationStrategy)
    }

    pub fn optimized_params(&self) -> Option<ParamMap> {
        self.get(Slot::OptimizedParams)
    }

    // ========== Preconditions ==========

    /// The selected stock, or a redirect to the stock page
    pub fn require_stock(&self) -> Result<StockSelection> {
        self.selected_stock().ok_or_else(|| {
            warn!("No stock selected, redirecting to {}", Page::StockSelect.path());
            AppError::Precondition {
                message: "Please select a stock first".to_string(),
                redirect: Page::StockSelect,
            }
        })
    }

    /// The last backtest result, or a redirect to the strategy page
    pub fn require_backtest_result(&self) -> Result<BacktestResult> {
        self.backtest_result().ok_or_else(|| {
            warn!("No backtest result, redirecting to {}", Page::Strategy.path());
            AppError::Precondition {
                message: "Please run a backtest first".to_string(),
                redirect: Page::Strategy,
            }
        })
    }

    // ========== Workflow transitions ==========

    /// Persist a stock pick. Earlier results and params are kept.
    pub fn select_stock(&self, stock: &StockSelection) -> Result<()> {
        self.put(Slot::SelectedStock, stock)?;
        info!("Selected stock {}", stock.label());
        self.set_stage(WorkflowStage::StockSelected);
        Ok(())
    }

    pub fn record_backtest(&self, strategy: &StrategyDescriptor, result: &BacktestResult) -> Result<()> {
        self.put(Slot::BacktestResult, result)?;
        self.put(Slot::BacktestStrategy, strategy)?;
        self.set_stage(WorkflowStage::ResultAvailable);
        Ok(())
    }

    pub fn record_optimization(&self, kind: StrategyKind, result: &OptimizationResult) -> Result<()> {
        self.put(Slot::OptimizedParams, &result.best_params)?;
        self.put(
            Slot::OptimizationStrategy,
            &OptimizedStrategy {
                kind,
                params: result.best_params.clone(),
            },
        )?;
        self.set_stage(WorkflowStage::ParamsOptimized);
        Ok(())
    }

    /// Carry chosen params back to strategy configuration
    pub fn apply_params(&self, params: &ParamMap) -> Result<()> {
        self.put(Slot::OptimizedParams, params)?;
        self.set_stage(WorkflowStage::StockSelected);
        Ok(())
    }

    /// Going back to strategy editing from a result
    pub fn resume_editing(&self) {
        if self.stage() == WorkflowStage::ResultAvailable {
            self.set_stage(WorkflowStage::StockSelected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::PerformanceMetrics;
    use crate::db::MemoryStore;
    use crate::strategy::{MacdParams, RsiParams};
    use serde_json::{json, Value};

    fn state() -> (Arc<MemoryStore>, SelectionState) {
        let store = Arc::new(MemoryStore::new());
        let state = SelectionState::new(store.clone());
        (store, state)
    }

    fn result(total_return: f64) -> BacktestResult {
        BacktestResult {
            performance_metrics: PerformanceMetrics {
                total_return,
                ..Default::default()
            },
            trades: vec![],
            monthly_returns: vec![],
            equity_curve: vec![],
            extra: Default::default(),
        }
    }

    #[test]
    fn test_get_before_put_is_absent() {
        let (_, state) = state();
        for slot in Slot::ALL {
            assert_eq!(state.get::<Value>(slot), None);
        }
    }

    #[test]
    fn test_put_replaces_without_merge() {
        let (_, state) = state();

        state.put(Slot::OptimizedParams, &json!({"short": 5})).unwrap();
        assert_eq!(state.get::<Value>(Slot::OptimizedParams), Some(json!({"short": 5})));

        state.put(Slot::OptimizedParams, &json!({"long": 20})).unwrap();
        assert_eq!(state.get::<Value>(Slot::OptimizedParams), Some(json!({"long": 20})));
    }

    #[test]
    fn test_corrupt_value_reads_as_absent() {
        let (store, state) = state();
        store.put(Slot::SelectedStock, "{not json").unwrap();

        assert_eq!(state.selected_stock(), None);
        assert!(matches!(
            state.require_stock(),
            Err(AppError::Precondition { redirect: Page::StockSelect, .. })
        ));
    }

    #[test]
    fn test_corrupt_sqlite_row_reads_as_absent() {
        let store = Arc::new(crate::db::SqliteDb::open_in_memory().unwrap());
        store.put(Slot::BacktestResult, "[1, 2").unwrap();

        let state = SelectionState::new(store);
        assert_eq!(state.backtest_result(), None);
        assert_eq!(state.stage(), WorkflowStage::NoStock);
    }

    #[test]
    fn test_wrong_shape_reads_as_absent() {
        let (store, state) = state();
        store.put(Slot::BacktestStrategy, r#"{"type":"unknown","params":{}}"#).unwrap();
        assert_eq!(state.backtest_strategy(), None);
    }

    #[test]
    fn test_strategy_round_trip() {
        let (_, state) = state();
        let descriptors = [
            StrategyDescriptor::default(),
            StrategyDescriptor::Rsi(RsiParams {
                period: 9,
                overbought: 75.0,
                oversold: 25.0,
            }),
            StrategyDescriptor::Macd(MacdParams {
                use_histogram: true,
                ..Default::default()
            }),
        ];

        for descriptor in descriptors {
            state.put(Slot::BacktestStrategy, &descriptor).unwrap();
            assert_eq!(state.backtest_strategy(), Some(descriptor));
        }
    }

    #[test]
    fn test_require_backtest_result_redirects_to_strategy() {
        let (_, state) = state();
        let err = state.require_backtest_result().unwrap_err();
        assert_eq!(err.redirect(), Some(Page::Strategy));

        state.put(Slot::BacktestResult, &result(0.2)).unwrap();
        assert_eq!(state.require_backtest_result().unwrap(), result(0.2));
    }

    #[test]
    fn test_initial_stage_follows_store() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(SelectionState::new(store.clone()).stage(), WorkflowStage::NoStock);

        store.put(Slot::SelectedStock, r#"{"symbol":"2330.TW"}"#).unwrap();
        assert_eq!(SelectionState::new(store).stage(), WorkflowStage::StockSelected);
    }

    #[test]
    fn test_workflow_transitions() {
        let (_, state) = state();
        let stock = StockSelection::new("2330.TW");

        state.select_stock(&stock).unwrap();
        assert_eq!(state.stage(), WorkflowStage::StockSelected);

        state.record_backtest(&StrategyDescriptor::default(), &result(0.1)).unwrap();
        assert_eq!(state.stage(), WorkflowStage::ResultAvailable);
        state.resume_editing();
        assert_eq!(state.stage(), WorkflowStage::StockSelected);

        let mut best = ParamMap::new();
        best.insert("short".to_string(), json!(7));
        best.insert("long".to_string(), json!(30));
        let optimization = OptimizationResult {
            best_params: best.clone(),
            results: vec![],
            target_metric: None,
            best_metric_value: None,
            extra: Default::default(),
        };
        state.record_optimization(StrategyKind::MaCross, &optimization).unwrap();
        assert_eq!(state.stage(), WorkflowStage::ParamsOptimized);
        assert_eq!(state.optimized_params(), Some(best.clone()));
        assert_eq!(
            state.optimization_strategy(),
            Some(OptimizedStrategy {
                kind: StrategyKind::MaCross,
                params: best.clone(),
            })
        );

        state.apply_params(&best).unwrap();
        assert_eq!(state.stage(), WorkflowStage::StockSelected);
    }

    #[test]
    fn test_reselecting_stock_keeps_results() {
        let (_, state) = state();
        state.select_stock(&StockSelection::new("2330.TW")).unwrap();
        state.record_backtest(&StrategyDescriptor::default(), &result(0.3)).unwrap();

        state.select_stock(&StockSelection::new("2317.TW")).unwrap();
        assert_eq!(state.stage(), WorkflowStage::StockSelected);
        assert_eq!(state.selected_stock().unwrap().symbol, "2317.TW");
        assert_eq!(state.backtest_result(), Some(result(0.3)));
    }

    #[test]
    fn test_clear_all_resets_stage() {
        let (_, state) = state();
        state.select_stock(&StockSelection::new("2330.TW")).unwrap();
        state.clear_all().unwrap();

        assert_eq!(state.stage(), WorkflowStage::NoStock);
        assert_eq!(state.selected_stock(), None);
    }
}
