use anyhow::{Context, Result};
use hdmint_config::HdMintConfig;
use hdmint_coin::{IdentityToken, SerialHash};
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

use crate::hdmint::{MintFilter, MintRecord, PoolEntry};
use crate::ledger::BlockHash;
use crate::storage::{MintBatch, MintStore};

const CF_MINTS: &str = "mints";
const CF_MINT_IDENTITIES: &str = "mint_identities";
const CF_MINT_POOL: &str = "mint_pool";
const CF_WALLET_META: &str = "wallet_meta";
const CF_BLOCK_CURSOR: &str = "block_cursor";

const KEY_COUNTER: &[u8] = b"counter";
const KEY_SEED_FINGERPRINT: &[u8] = b"seed_fingerprint";

/// A thread-safe wrapper around RocksDB.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens the database at the specified path, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = vec![
            ColumnFamilyDescriptor::new(CF_MINTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_MINT_IDENTITIES, Options::default()),
            ColumnFamilyDescriptor::new(CF_MINT_POOL, Options::default()),
            ColumnFamilyDescriptor::new(CF_WALLET_META, Options::default()),
            ColumnFamilyDescriptor::new(CF_BLOCK_CURSOR, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Opens the database at `database.path` of the given configuration.
    pub fn from_config(config: &HdMintConfig) -> Result<Self> {
        Self::open(&config.database.path)
            .with_context(|| format!("opening mint store at {}", config.database.path))
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .with_context(|| format!("{} column family missing", name))
    }
}

fn decode_hash(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes.try_into().context("invalid 32-byte value")
}

fn decode_height(key: &[u8]) -> Result<u64> {
    Ok(u64::from_be_bytes(
        key.try_into().context("invalid height key length")?,
    ))
}

impl MintStore for RocksDbStore {
    fn get_counter(&self) -> Result<u32> {
        let cf = self.cf(CF_WALLET_META)?;
        match self.db.get_cf(cf, KEY_COUNTER)? {
            Some(bytes) => Ok(u32::from_be_bytes(
                bytes.as_slice().try_into().context("invalid counter length")?,
            )),
            None => Ok(0),
        }
    }

    fn set_counter(&self, count: u32) -> Result<()> {
        let cf = self.cf(CF_WALLET_META)?;
        self.db.put_cf(cf, KEY_COUNTER, count.to_be_bytes())?;
        Ok(())
    }

    fn put_mint_record(&self, record: &MintRecord) -> Result<()> {
        self.apply(MintBatch {
            records: vec![record.clone()],
            ..MintBatch::default()
        })
    }

    fn get_mint_record(&self, serial_hash: &SerialHash) -> Result<Option<MintRecord>> {
        let cf = self.cf(CF_MINTS)?;
        match self.db.get_cf(cf, serial_hash)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_mint_record_by_identity(&self, identity: &IdentityToken) -> Result<Option<MintRecord>> {
        let cf = self.cf(CF_MINT_IDENTITIES)?;
        match self.db.get_cf(cf, identity)? {
            Some(bytes) => self.get_mint_record(&SerialHash(decode_hash(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_mint_records(&self, filter: MintFilter) -> Result<Vec<MintRecord>> {
        let cf = self.cf(CF_MINTS)?;
        let mut records = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let record: MintRecord = serde_json::from_slice(&value)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }

        records.sort_by_key(|r| (r.index, r.serial_hash));
        Ok(records)
    }

    fn load_pool(&self) -> Result<Vec<PoolEntry>> {
        let cf = self.cf(CF_MINT_POOL)?;
        let mut entries = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            entries.push(serde_json::from_slice(&value)?);
        }

        Ok(entries)
    }

    fn get_seed_fingerprint(&self) -> Result<Option<[u8; 32]>> {
        let cf = self.cf(CF_WALLET_META)?;
        self.db
            .get_cf(cf, KEY_SEED_FINGERPRINT)?
            .map(|bytes| decode_hash(&bytes))
            .transpose()
    }

    fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>> {
        let cf = self.cf(CF_BLOCK_CURSOR)?;
        self.db
            .get_cf(cf, height.to_be_bytes())?
            .map(|bytes| decode_hash(&bytes))
            .transpose()
    }

    fn last_processed(&self) -> Result<Option<(u64, BlockHash)>> {
        let cf = self.cf(CF_BLOCK_CURSOR)?;
        let mut iter = self.db.iterator_cf(cf, IteratorMode::End);
        match iter.next() {
            Some(item) => {
                let (key, value) = item?;
                Ok(Some((decode_height(&key)?, decode_hash(&value)?)))
            }
            None => Ok(None),
        }
    }

    /// Apply a batch of wallet writes atomically
    fn apply(&self, operations: MintBatch) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_mints = self.cf(CF_MINTS)?;
        let cf_identities = self.cf(CF_MINT_IDENTITIES)?;
        let cf_pool = self.cf(CF_MINT_POOL)?;
        let cf_meta = self.cf(CF_WALLET_META)?;
        let cf_cursor = self.cf(CF_BLOCK_CURSOR)?;

        if operations.clear_pool {
            for item in self.db.iterator_cf(cf_pool, IteratorMode::Start) {
                let (key, _) = item?;
                batch.delete_cf(cf_pool, key);
            }
        }

        // Height u64::MAX is never processed, so exclusive ends are fine
        if let Some(from) = operations.truncate_cursor_from {
            batch.delete_range_cf(cf_cursor, from.to_be_bytes(), u64::MAX.to_be_bytes());
        }
        if let Some(below) = operations.prune_cursor_below {
            batch.delete_range_cf(cf_cursor, 0u64.to_be_bytes(), below.to_be_bytes());
        }

        for identity in &operations.pool_removed {
            batch.delete_cf(cf_pool, identity);
        }

        for entry in &operations.pool_added {
            batch.put_cf(cf_pool, entry.identity, serde_json::to_vec(entry)?);
        }

        for record in &operations.records {
            batch.put_cf(cf_mints, record.serial_hash, serde_json::to_vec(record)?);
            batch.put_cf(cf_identities, record.identity, record.serial_hash);
        }

        for (height, hash) in &operations.block_hashes {
            batch.put_cf(cf_cursor, height.to_be_bytes(), hash);
        }

        if let Some(fp) = operations.seed_fingerprint {
            batch.put_cf(cf_meta, KEY_SEED_FINGERPRINT, fp);
        }
        if let Some(counter) = operations.counter {
            batch.put_cf(cf_meta, KEY_COUNTER, counter.to_be_bytes());
        }

        self.db.write(batch)?;
        Ok(())
    }
}
