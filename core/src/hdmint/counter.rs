//! Index Counter
//!
//! Tracks the last index handed out or observed on chain. The value only
//! moves forward, and only a reseed may put it back to zero.

use crate::error::{Result, WalletError};
use crate::storage::MintStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MintCounter {
    last_used: u32,
    persisted: u32,
}

impl MintCounter {
    /// Counter as last written to the store
    pub fn load<S: MintStore + ?Sized>(store: &S) -> Result<Self> {
        let last_used = store.get_counter().map_err(WalletError::Store)?;
        Ok(Self {
            last_used,
            persisted: last_used,
        })
    }

    pub fn get(&self) -> u32 {
        self.last_used
    }

    pub fn persisted(&self) -> u32 {
        self.persisted
    }

    pub fn has_unpersisted(&self) -> bool {
        self.last_used != self.persisted
    }

    /// Index the next allocation would use
    pub fn next_index(&self) -> Result<u32> {
        self.last_used
            .checked_add(1)
            .ok_or(WalletError::IndexOverflow(self.last_used))
    }

    /// Move the in-memory value to `count`, which may not be lower
    pub fn set(&mut self, count: u32) -> Result<()> {
        if count < self.last_used {
            return Err(WalletError::CounterRegression {
                current: self.last_used,
                requested: count,
            });
        }
        self.last_used = count;
        Ok(())
    }

    pub fn advance_local(&mut self) -> Result<u32> {
        self.last_used = self.next_index()?;
        Ok(self.last_used)
    }

    pub fn persist<S: MintStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        store
            .set_counter(self.last_used)
            .map_err(WalletError::Store)?;
        self.persisted = self.last_used;
        Ok(())
    }

    /// Advance and write through. Memory is untouched if the write fails.
    pub fn advance_and_persist<S: MintStore + ?Sized>(&mut self, store: &S) -> Result<u32> {
        let next = self.next_index()?;
        store.set_counter(next).map_err(WalletError::Store)?;
        self.last_used = next;
        self.persisted = next;
        Ok(next)
    }

    /// Record that the current value reached the store through a batch
    pub fn mark_persisted(&mut self) {
        self.persisted = self.last_used;
    }

    /// Zero the counter for a new seed lineage
    pub(crate) fn reset(&mut self) {
        self.last_used = 0;
    }
}
