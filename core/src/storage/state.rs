use anyhow::Result;
use hdmint_coin::{IdentityToken, SerialHash};

use crate::hdmint::{MintFilter, MintRecord, PoolEntry};
use crate::ledger::BlockHash;

/// Durable storage for the wallet: the index counter, mint records, the
/// look-ahead pool, the seed fingerprint and the processed-block cursor.
///
/// Single writes exist for callers that need them; the wallet itself
/// commits through [`MintStore::apply`] so a block is recorded entirely or
/// not at all.
pub trait MintStore: Send + Sync {
    /// Last index handed out. Zero for a fresh wallet.
    fn get_counter(&self) -> Result<u32>;

    fn set_counter(&self, count: u32) -> Result<()>;

    /// Insert or overwrite the record stored under its serial hash
    fn put_mint_record(&self, record: &MintRecord) -> Result<()>;

    fn get_mint_record(&self, serial_hash: &SerialHash) -> Result<Option<MintRecord>>;

    fn get_mint_record_by_identity(&self, identity: &IdentityToken) -> Result<Option<MintRecord>>;

    /// Records matching `filter`, ordered by index
    fn list_mint_records(&self, filter: MintFilter) -> Result<Vec<MintRecord>>;

    fn load_pool(&self) -> Result<Vec<PoolEntry>>;

    fn get_seed_fingerprint(&self) -> Result<Option<[u8; 32]>>;

    /// Hash recorded for a processed height
    fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>>;

    /// Highest processed block
    fn last_processed(&self) -> Result<Option<(u64, BlockHash)>>;

    /// Commit a batch atomically
    fn apply(&self, batch: MintBatch) -> Result<()>;
}

/// Batch of wallet writes for atomic commit.
///
/// Applied in field order: deletions first, then inserts, then the counter.
#[derive(Debug, Default, Clone)]
pub struct MintBatch {
    /// Drop every pool entry before adding `pool_added`
    pub clear_pool: bool,
    /// Forget processed blocks at or above this height
    pub truncate_cursor_from: Option<u64>,
    /// Forget processed blocks below this height
    pub prune_cursor_below: Option<u64>,
    pub pool_removed: Vec<IdentityToken>,
    pub pool_added: Vec<PoolEntry>,
    pub records: Vec<MintRecord>,
    pub block_hashes: Vec<(u64, BlockHash)>,
    pub seed_fingerprint: Option<[u8; 32]>,
    pub counter: Option<u32>,
}

impl MintBatch {
    pub fn is_empty(&self) -> bool {
        !self.clear_pool
            && self.truncate_cursor_from.is_none()
            && self.prune_cursor_below.is_none()
            && self.pool_removed.is_empty()
            && self.pool_added.is_empty()
            && self.records.is_empty()
            && self.block_hashes.is_empty()
            && self.seed_fingerprint.is_none()
            && self.counter.is_none()
    }

    /// Staged record for `identity`, if this batch writes one
    pub fn staged_record(&self, identity: &IdentityToken) -> Option<&MintRecord> {
        self.records.iter().rev().find(|r| &r.identity == identity)
    }
}
