//! Backend request versioning
//!
//! Each backend call takes a [`Ticket`] from a per-operation counter. A
//! response may only touch state while its ticket is still the latest one
//! issued for that operation; anything older is discarded.

use crate::error::{AppError, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::warn;

/// Kinds of backend request that are versioned independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Search,
    StockData,
    Backtest,
    Optimization,
    Indicators,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Search,
        Operation::StockData,
        Operation::Backtest,
        Operation::Optimization,
        Operation::Indicators,
    ];

    fn index(&self) -> usize {
        match self {
            Operation::Search => 0,
            Operation::StockData => 1,
            Operation::Backtest => 2,
            Operation::Optimization => 3,
            Operation::Indicators => 4,
        }
    }
}

#[derive(Debug, Default)]
struct Counter {
    latest: AtomicU64,
    in_flight: AtomicUsize,
}

/// Sequence counters for every [`Operation`]
#[derive(Debug, Default)]
pub struct RequestTracker {
    counters: [Counter; 5],
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one for `op`
    pub fn begin(&self, op: Operation) -> Ticket<'_> {
        let counter = &self.counters[op.index()];
        let seq = counter.latest.fetch_add(1, Ordering::SeqCst) + 1;
        counter.in_flight.fetch_add(1, Ordering::SeqCst);

        Ticket { tracker: self, op, seq }
    }

    /// Sequence number of the newest ticket issued for `op` (0 if none)
    pub fn latest(&self, op: Operation) -> u64 {
        self.counters[op.index()].latest.load(Ordering::SeqCst)
    }

    /// Whether any request for `op` is still outstanding
    pub fn is_loading(&self, op: Operation) -> bool {
        self.counters[op.index()].in_flight.load(Ordering::SeqCst) > 0
    }

    /// Operations with requests outstanding
    pub fn loading(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.is_loading(*op))
            .collect()
    }
}

/// Handle for one outstanding request; releases its in-flight mark on drop
#[derive(Debug)]
pub struct Ticket<'a> {
    tracker: &'a RequestTracker,
    op: Operation,
    seq: u64,
}

impl Ticket<'_> {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_current(&self) -> bool {
        self.tracker.latest(self.op) == self.seq
    }

    /// Error out if a newer request for the same operation was issued
    pub fn ensure_current(&self) -> Result<()> {
        if self.is_current() {
            return Ok(());
        }

        warn!(
            "Discarding superseded {:?} response #{} (latest #{})",
            self.op,
            self.seq,
            self.tracker.latest(self.op)
        );
        Err(AppError::Superseded(format!(
            "a newer {:?} request was issued",
            self.op
        )))
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        self.tracker.counters[self.op.index()]
            .in_flight
            .fetch_sub(1, Ordering::SeqCst);
    }
}
