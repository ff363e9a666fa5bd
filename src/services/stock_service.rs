//! Stock Service
//!
//! Handles stock search and the active stock selection.

use crate::analytics::StockSelection;
use crate::error::{AppError, Result};
use crate::requests::Operation;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of selecting a stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSelectResult {
    pub success: bool,
    pub stock: StockSelection,
    pub message: String,
}

/// Stock service for business logic
pub struct StockService;

impl StockService {
    /// Search stocks by symbol or name fragment
    pub async fn search(state: &AppState, query: &str) -> Result<Vec<StockSelection>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation(
                "Please enter a stock symbol or name".to_string(),
            ));
        }

        info!("StockService::search - {}", query);

        let ticket = state.requests.begin(Operation::Search);
        let results = state.analytics.search_stocks(query).await?;
        ticket.ensure_current()?;

        info!("StockService::search - {} results for {}", results.len(), query);
        Ok(results)
    }

    /// Make `stock` the active selection
    pub fn select(state: &AppState, stock: StockSelection) -> Result<StockSelectResult> {
        if stock.symbol.trim().is_empty() {
            return Err(AppError::Validation("Stock symbol is required".to_string()));
        }

        info!("StockService::select - {}", stock.symbol);
        state.selection.select_stock(&stock)?;

        Ok(StockSelectResult {
            success: true,
            message: format!("Selected {}", stock.label()),
            stock,
        })
    }

    /// Persisted selection, if any
    pub fn current(state: &AppState) -> Option<StockSelection> {
        state.selection.selected_stock()
    }
}
