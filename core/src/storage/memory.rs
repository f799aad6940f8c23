use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use hdmint_coin::{IdentityToken, SerialHash};

use crate::hdmint::{MintFilter, MintRecord, PoolEntry};
use crate::ledger::BlockHash;
use crate::storage::{MintBatch, MintStore};

#[derive(Default)]
struct Inner {
    counter: u32,
    records: HashMap<SerialHash, MintRecord>,
    identities: HashMap<IdentityToken, SerialHash>,
    pool: BTreeMap<IdentityToken, PoolEntry>,
    seed_fingerprint: Option<[u8; 32]>,
    cursor: BTreeMap<u64, BlockHash>,
}

impl Inner {
    fn put_record(&mut self, record: MintRecord) {
        self.identities.insert(record.identity, record.serial_hash);
        self.records.insert(record.serial_hash, record);
    }
}

/// Non-persistent store with the same semantics as the RocksDB store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl MintStore for MemoryStore {
    fn get_counter(&self) -> Result<u32> {
        Ok(self.inner()?.counter)
    }

    fn set_counter(&self, count: u32) -> Result<()> {
        self.inner()?.counter = count;
        Ok(())
    }

    fn put_mint_record(&self, record: &MintRecord) -> Result<()> {
        self.inner()?.put_record(record.clone());
        Ok(())
    }

    fn get_mint_record(&self, serial_hash: &SerialHash) -> Result<Option<MintRecord>> {
        Ok(self.inner()?.records.get(serial_hash).cloned())
    }

    fn get_mint_record_by_identity(&self, identity: &IdentityToken) -> Result<Option<MintRecord>> {
        let inner = self.inner()?;
        Ok(inner
            .identities
            .get(identity)
            .and_then(|serial| inner.records.get(serial))
            .cloned())
    }

    fn list_mint_records(&self, filter: MintFilter) -> Result<Vec<MintRecord>> {
        let mut records: Vec<MintRecord> = self
            .inner()?
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.index, r.serial_hash));
        Ok(records)
    }

    fn load_pool(&self) -> Result<Vec<PoolEntry>> {
        Ok(self.inner()?.pool.values().copied().collect())
    }

    fn get_seed_fingerprint(&self) -> Result<Option<[u8; 32]>> {
        Ok(self.inner()?.seed_fingerprint)
    }

    fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>> {
        Ok(self.inner()?.cursor.get(&height).copied())
    }

    fn last_processed(&self) -> Result<Option<(u64, BlockHash)>> {
        Ok(self
            .inner()?
            .cursor
            .last_key_value()
            .map(|(h, hash)| (*h, *hash)))
    }

    fn apply(&self, batch: MintBatch) -> Result<()> {
        let mut inner = self.inner()?;

        if batch.clear_pool {
            inner.pool.clear();
        }
        if let Some(from) = batch.truncate_cursor_from {
            inner.cursor.retain(|height, _| *height < from);
        }
        if let Some(below) = batch.prune_cursor_below {
            inner.cursor.retain(|height, _| *height >= below);
        }
        for identity in &batch.pool_removed {
            inner.pool.remove(identity);
        }
        for entry in batch.pool_added {
            inner.pool.insert(entry.identity, entry);
        }
        for record in batch.records {
            inner.put_record(record);
        }
        for (height, hash) in batch.block_hashes {
            inner.cursor.insert(height, hash);
        }
        if let Some(fp) = batch.seed_fingerprint {
            inner.seed_fingerprint = Some(fp);
        }
        if let Some(counter) = batch.counter {
            inner.counter = counter;
        }
        Ok(())
    }
}
