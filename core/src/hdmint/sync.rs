//! Chain Synchronizer
//!
//! Scans blocks from the last processed height to the ledger tip, matching
//! mint outputs against the look-ahead pool.
//!
//! Each block is committed with one [`MintBatch`]: matched records, pool
//! changes, the counter and the block cursor land together or not at all.
//! Work happens on copies of the pool and counter, which replace the live
//! state only after the batch is written.
//!
//! Reorgs are found by walking the cursor back until its hash agrees with
//! the ledger. Records confirmed above that point go back to the pool.

use hdmint_coin::{CoinAmount, IdentityToken, MintScript, is_mint_script};
use log::{debug, error, info, warn};

use crate::config::WalletConfig;
use crate::error::{Result, WalletError};
use crate::hdmint::pool::{MintPool, window_range};
use crate::hdmint::seed;
use crate::hdmint::wallet::WalletState;
use crate::hdmint::{MintFilter, MintRecord, PoolEntry, builder};
use crate::ledger::{Block, Ledger, SerialLookup, TxId};
use crate::storage::{MintBatch, MintStore};

/// Outcome of one synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub full_resync: bool,
    /// Last height common to the cursor and the ledger when a reorg was undone
    pub fork_height: Option<u64>,
    pub tip_height: Option<u64>,
    pub blocks_scanned: u64,
    /// Indices confirmed during this pass
    pub confirmed: Vec<u32>,
    /// Indices returned to the pool by a reorg
    pub demoted: Vec<u32>,
    pub spends_linked: usize,
}

pub(crate) struct ChainSynchronizer<'a, S: ?Sized, L: ?Sized> {
    store: &'a S,
    ledger: &'a L,
    config: &'a WalletConfig,
    state: &'a mut WalletState,
}

impl<'a, S, L> ChainSynchronizer<'a, S, L>
where
    S: MintStore + ?Sized,
    L: Ledger + ?Sized,
{
    pub fn new(
        store: &'a S,
        ledger: &'a L,
        config: &'a WalletConfig,
        state: &'a mut WalletState,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            state,
        }
    }

    pub fn run(mut self, full_resync: bool) -> Result<SyncReport> {
        let mut report = SyncReport {
            full_resync,
            ..SyncReport::default()
        };

        let start = if full_resync {
            self.reset_for_full_resync()?;
            0
        } else {
            self.rewind_to_fork(&mut report)?
        };

        let tip = self.ledger.tip_height().map_err(WalletError::Ledger)?;
        report.tip_height = tip;

        if let Some(tip) = tip {
            for height in start..=tip {
                let block = self
                    .ledger
                    .block_at(height)
                    .map_err(WalletError::Ledger)?
                    .ok_or(WalletError::MissingBlock(height))?;
                self.process_block(&block, full_resync, &mut report)?;
            }
        }

        top_up_pool(self.state, self.store, self.config.lookahead_window)?;

        info!(
            "Sync done: scanned={} confirmed={} demoted={} spends={} last_used={}",
            report.blocks_scanned,
            report.confirmed.len(),
            report.demoted.len(),
            report.spends_linked,
            self.state.counter.get()
        );
        Ok(report)
    }

    /// Rebuild the pool from index 1 and forget the cursor so the whole
    /// chain is replayed.
    fn reset_for_full_resync(&mut self) -> Result<()> {
        let master = self.state.seed.ok_or(WalletError::Locked)?;
        let top = self
            .state
            .counter
            .get()
            .saturating_add(self.config.lookahead_window);

        let mut pool = MintPool::new();
        let mut batch = MintBatch {
            clear_pool: true,
            truncate_cursor_from: Some(0),
            ..MintBatch::default()
        };

        for index in 1..=top {
            let derived = seed::derive(&master, index);
            let existing = self
                .store
                .get_mint_record_by_identity(&derived.identity)
                .map_err(WalletError::Store)?;

            let entry = match existing {
                Some(mut record) => {
                    if record.is_confirmed() || record.is_spent() {
                        record.confirmed_height = None;
                        record.spend_txid = None;
                        batch.records.push(record.clone());
                    }
                    record.pool_entry()
                }
                None => builder::pool_entry(&derived)?,
            };
            if pool.insert(entry) {
                batch.pool_added.push(entry);
            }
        }

        info!(
            "Full resync: rebuilt pool with {} entries, replaying from genesis",
            pool.len()
        );

        self.store.apply(batch).map_err(WalletError::Store)?;
        self.state.pool = pool;
        Ok(())
    }

    /// Find the first height to scan, undoing any reorg on the way
    fn rewind_to_fork(&mut self, report: &mut SyncReport) -> Result<u64> {
        let Some((last_height, last_hash)) =
            self.store.last_processed().map_err(WalletError::Store)?
        else {
            return Ok(0);
        };

        let mut height = last_height;
        let mut stored = last_hash;
        let fork = loop {
            let on_chain = self
                .ledger
                .block_at(height)
                .map_err(WalletError::Ledger)?
                .map(|b| b.hash);
            if on_chain == Some(stored) {
                break Some(height);
            }
            if height == 0 {
                break None;
            }
            height -= 1;
            stored = self
                .store
                .get_block_hash(height)
                .map_err(WalletError::Store)?
                .ok_or(WalletError::ReorgTooDeep(height))?;
        };

        if fork == Some(last_height) {
            return Ok(last_height + 1);
        }

        warn!(
            "Reorg detected: processed tip {} no longer on chain, fork at {:?}",
            last_height, fork
        );
        self.disconnect_above(fork, report)?;
        report.fork_height = fork;
        Ok(fork.map_or(0, |h| h + 1))
    }

    /// Return records confirmed above `fork` to the pool and re-check
    /// spend links against the new chain.
    fn disconnect_above(&mut self, fork: Option<u64>, report: &mut SyncReport) -> Result<()> {
        let orphaned = |height: u64| fork.is_none_or(|f| height > f);

        let mut pool = self.state.pool.clone();
        let mut batch = MintBatch {
            truncate_cursor_from: Some(fork.map_or(0, |f| f + 1)),
            ..MintBatch::default()
        };

        let confirmed = self
            .store
            .list_mint_records(MintFilter::Confirmed)
            .map_err(WalletError::Store)?;

        for mut record in confirmed {
            if record.confirmed_height.is_some_and(orphaned) {
                record.confirmed_height = None;
                record.spend_txid = None;

                let entry = record.pool_entry();
                if pool.insert(entry) {
                    batch.pool_added.push(entry);
                }
                report.demoted.push(record.index);
                debug!("Mint {} orphaned by reorg", record.index);
                batch.records.push(record);
            } else if record.is_spent() {
                let spend = match self
                    .ledger
                    .serial_status(&record.serial_hash)
                    .map_err(WalletError::Ledger)?
                {
                    SerialLookup::Found { txid, .. } => Some(txid),
                    SerialLookup::Absent => None,
                };
                if spend != record.spend_txid {
                    debug!("Spend link of mint {} changed by reorg", record.index);
                    record.spend_txid = spend;
                    batch.records.push(record);
                }
            }
        }

        self.store.apply(batch).map_err(WalletError::Store)?;
        self.state.pool = pool;
        Ok(())
    }

    fn process_block(&mut self, block: &Block, full: bool, report: &mut SyncReport) -> Result<()> {
        let mut pool = self.state.pool.clone();
        let mut counter = self.state.counter;
        let mut batch = MintBatch::default();
        let mut matched = Vec::new();

        for tx in &block.transactions {
            for output in &tx.outputs {
                if !is_mint_script(&output.script) {
                    continue;
                }
                let script = match MintScript::parse(&output.script) {
                    Ok(script) => script,
                    Err(e) => {
                        debug!("Skipping mint output in {}: {}", hex::encode(tx.txid), e);
                        continue;
                    }
                };
                let Some(entry) = pool.get(&script.identity).copied() else {
                    continue;
                };
                if entry.public_coin != script.public_coin {
                    warn!(
                        "Identity {} matches index {} but public coin differs, ignoring",
                        script.identity, entry.index
                    );
                    continue;
                }
                if let Err(e) = CoinAmount::new(output.value) {
                    warn!(
                        "Mint {} carries an unusable value in {}: {}, ignoring",
                        entry.index,
                        hex::encode(tx.txid),
                        e
                    );
                    continue;
                }

                let spend = self.check_serial(&entry, &batch, block.height)?;

                pool.remove(&entry.identity);
                batch.pool_removed.push(entry.identity);

                let mut record = MintRecord::confirmed(&entry, output.value, block.height);
                record.spend_txid = spend;
                if spend.is_some() {
                    report.spends_linked += 1;
                }
                batch.records.push(record);
                matched.push(entry.index);

                info!("Mint {} confirmed at height {}", entry.index, block.height);
            }

            for serial in &tx.spent_serials {
                if let Some(record) = batch.records.iter_mut().find(|r| &r.serial_hash == serial) {
                    if record.spend_txid.is_none() {
                        record.spend_txid = Some(tx.txid);
                        report.spends_linked += 1;
                    }
                    continue;
                }
                let Some(mut record) = self
                    .store
                    .get_mint_record(serial)
                    .map_err(WalletError::Store)?
                else {
                    continue;
                };
                if record.is_confirmed() && !record.is_spent() {
                    debug!("Mint {} spent in {}", record.index, hex::encode(tx.txid));
                    record.spend_txid = Some(tx.txid);
                    batch.records.push(record);
                    report.spends_linked += 1;
                }
            }
        }

        // Only a full resync learns the counter from the chain
        if full
            && let Some(&highest) = matched.iter().max()
            && highest > counter.get()
        {
            counter.set(highest)?;
        }

        if let Some(master) = self.state.seed {
            let window = window_range(counter.get(), self.config.lookahead_window);
            let store = self.store;
            let added = pool.refill(&master, *window.start(), *window.end(), |id| {
                is_confirmed(store, &batch, id)
            })?;
            batch.pool_added.extend(added);
        }

        batch.block_hashes.push((block.height, block.hash));
        let depth = u64::from(self.config.cursor_depth);
        if depth > 0 && block.height >= depth {
            batch.prune_cursor_below = Some(block.height + 1 - depth);
        }
        if counter.get() != self.state.counter.get() {
            batch.counter = Some(counter.get());
        }

        self.store.apply(batch).map_err(WalletError::Store)?;
        counter.mark_persisted();
        self.state.pool = pool;
        self.state.counter = counter;

        report.blocks_scanned += 1;
        report.confirmed.extend(matched);
        Ok(())
    }

    /// Reject a match whose serial already belongs to another mint or was
    /// revealed before this block. Returns the spend to link otherwise.
    fn check_serial(&self, entry: &PoolEntry, batch: &MintBatch, height: u64) -> Result<Option<TxId>> {
        let collision = || {
            error!(
                "Serial collision for index {} at height {}: {}",
                entry.index, height, entry.serial_hash
            );
            WalletError::SerialCollision {
                index: entry.index,
                serial_hash: entry.serial_hash,
            }
        };

        let staged = batch
            .records
            .iter()
            .find(|r| r.serial_hash == entry.serial_hash)
            .cloned();
        let existing = match staged {
            Some(record) => Some(record),
            None => self
                .store
                .get_mint_record(&entry.serial_hash)
                .map_err(WalletError::Store)?,
        };
        if let Some(existing) = existing {
            if existing.identity != entry.identity || existing.is_confirmed() {
                return Err(collision());
            }
        }

        match self
            .ledger
            .serial_status(&entry.serial_hash)
            .map_err(WalletError::Ledger)?
        {
            SerialLookup::Found { height: spent_at, .. } if spent_at < height => Err(collision()),
            SerialLookup::Found { txid, .. } => Ok(Some(txid)),
            SerialLookup::Absent => Ok(None),
        }
    }
}

/// True if `identity` has a confirmed record, staged or stored
fn is_confirmed<S: MintStore + ?Sized>(
    store: &S,
    batch: &MintBatch,
    identity: &IdentityToken,
) -> Result<bool> {
    if let Some(record) = batch.staged_record(identity) {
        return Ok(record.is_confirmed());
    }
    Ok(store
        .get_mint_record_by_identity(identity)
        .map_err(WalletError::Store)?
        .is_some_and(|r| r.is_confirmed()))
}

/// Fill the look-ahead window above the counter and persist new entries.
/// A locked wallet has no seed to derive with and is left as is.
pub(crate) fn top_up_pool<S: MintStore + ?Sized>(
    state: &mut WalletState,
    store: &S,
    window: u32,
) -> Result<usize> {
    let Some(master) = state.seed else {
        return Ok(0);
    };

    let range = window_range(state.counter.get(), window);
    let mut pool = state.pool.clone();
    let empty = MintBatch::default();
    let added = pool.refill(&master, *range.start(), *range.end(), |id| {
        is_confirmed(store, &empty, id)
    })?;

    if added.is_empty() {
        return Ok(0);
    }
    let count = added.len();
    store
        .apply(MintBatch {
            pool_added: added,
            ..MintBatch::default()
        })
        .map_err(WalletError::Store)?;
    state.pool = pool;

    debug!("Pool topped up with {} entries", count);
    Ok(count)
}
