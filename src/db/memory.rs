//! In-memory store, used by tests and ephemeral sessions

use crate::db::{Slot, StateStore};
use crate::error::Result;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<Slot, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, slot: Slot) -> Result<Option<String>> {
        Ok(self.values.get(&slot).map(|v| v.clone()))
    }

    fn put(&self, slot: Slot, value: &str) -> Result<()> {
        self.values.insert(slot, value.to_string());
        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<()> {
        self.values.remove(&slot);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values.clear();
        Ok(())
    }
}
