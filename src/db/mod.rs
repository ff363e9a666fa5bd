//! Persistent key-value state
//!
//! Cross-page state lives in a small fixed set of named slots, each holding
//! one JSON document. Stores only move raw strings; typing and
//! (de)serialization happen in [`crate::selection`].

pub mod memory;
pub mod sqlite;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use memory::MemoryStore;
pub use sqlite::SqliteDb;

/// The valid store keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "selectedStock")]
    SelectedStock,
    #[serde(rename = "backtestResult")]
    BacktestResult,
    #[serde(rename = "backtestStrategy")]
    BacktestStrategy,
    #[serde(rename = "optimizationStrategy")]
    OptimizationStrategy,
    #[serde(rename = "optimizedParams")]
    OptimizedParams,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::SelectedStock,
        Slot::BacktestResult,
        Slot::BacktestStrategy,
        Slot::OptimizationStrategy,
        Slot::OptimizedParams,
    ];

    /// Storage key
    pub fn key(&self) -> &'static str {
        match self {
            Slot::SelectedStock => "selectedStock",
            Slot::BacktestResult => "backtestResult",
            Slot::BacktestStrategy => "backtestStrategy",
            Slot::OptimizationStrategy => "optimizationStrategy",
            Slot::OptimizedParams => "optimizedParams",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// String-valued store over [`Slot`] keys.
///
/// Writes replace the whole value. There are no multi-slot transactions.
pub trait StateStore: Send + Sync {
    fn get(&self, slot: Slot) -> Result<Option<String>>;

    fn put(&self, slot: Slot, value: &str) -> Result<()>;

    fn remove(&self, slot: Slot) -> Result<()>;

    /// Remove every slot
    fn clear(&self) -> Result<()> {
        for slot in Slot::ALL {
            self.remove(slot)?;
        }
        Ok(())
    }
}
