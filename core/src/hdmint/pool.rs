//! Look-ahead Mint Pool
//!
//! Pre-derived pool entries for indices the wallet expects to see on chain,
//! looked up by identity token during block scans.
//!
//! The pool holds the window `(last_used, last_used + window]` plus any
//! lower index that is allocated or was orphaned by a reorg and has not been
//! confirmed yet.

use std::collections::{BTreeMap, HashMap};

use hdmint_coin::IdentityToken;

use crate::error::{Result, WalletError};
use crate::hdmint::seed::{self, MasterSeedHash};
use crate::hdmint::{PoolEntry, builder};
use crate::storage::MintStore;

#[derive(Debug, Clone, Default)]
pub struct MintPool {
    entries: HashMap<IdentityToken, PoolEntry>,
    by_index: BTreeMap<u32, IdentityToken>,
}

impl MintPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the in-memory pool from persisted entries
    pub fn load<S: MintStore + ?Sized>(store: &S) -> Result<Self> {
        let mut pool = Self::new();
        for entry in store.load_pool().map_err(WalletError::Store)? {
            pool.insert(entry);
        }
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the pending mint with this identity
    pub fn lookup(&self, identity: &IdentityToken) -> Option<u32> {
        self.entries.get(identity).map(|e| e.index)
    }

    pub fn get(&self, identity: &IdentityToken) -> Option<&PoolEntry> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &IdentityToken) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn contains_index(&self, index: u32) -> bool {
        self.by_index.contains_key(&index)
    }

    pub fn highest_index(&self) -> Option<u32> {
        self.by_index.last_key_value().map(|(i, _)| *i)
    }

    /// Insert an entry. Returns false if its index is already present.
    pub fn insert(&mut self, entry: PoolEntry) -> bool {
        if self.by_index.contains_key(&entry.index) {
            return false;
        }
        self.by_index.insert(entry.index, entry.identity);
        self.entries.insert(entry.identity, entry);
        true
    }

    pub fn remove(&mut self, identity: &IdentityToken) -> Option<PoolEntry> {
        let entry = self.entries.remove(identity)?;
        self.by_index.remove(&entry.index);
        Some(entry)
    }

    /// Drop every entry, returning how many were held
    pub fn invalidate_all(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.by_index.clear();
        dropped
    }

    /// Entries ordered by index
    pub fn entries(&self) -> impl Iterator<Item = &PoolEntry> {
        self.by_index.values().filter_map(|id| self.entries.get(id))
    }

    /// Derive and insert every index in `[from, to]` that is neither pooled
    /// nor already confirmed, returning the new entries.
    pub fn refill<F>(
        &mut self,
        master: &MasterSeedHash,
        from: u32,
        to: u32,
        mut is_confirmed: F,
    ) -> Result<Vec<PoolEntry>>
    where
        F: FnMut(&IdentityToken) -> Result<bool>,
    {
        let mut added = Vec::new();
        for index in from..=to {
            if self.contains_index(index) {
                continue;
            }
            let derived = seed::derive(master, index);
            if is_confirmed(&derived.identity)? {
                continue;
            }
            let entry = builder::pool_entry(&derived)?;
            self.insert(entry);
            added.push(entry);
        }
        Ok(added)
    }

    /// True if every index in the window above `last_used` is pooled or
    /// satisfies `is_confirmed`
    pub fn window_complete<F>(&self, last_used: u32, window: u32, mut is_confirmed: F) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        window_range(last_used, window)
            .all(|index| self.contains_index(index) || is_confirmed(index))
    }
}

/// Indices `(last_used, last_used + window]`, clipped to the index space
pub fn window_range(last_used: u32, window: u32) -> std::ops::RangeInclusive<u32> {
    match last_used.checked_add(1) {
        Some(from) => from..=last_used.saturating_add(window),
        #[allow(clippy::reversed_empty_ranges)]
        None => 1..=0,
    }
}
