//! HD Mint Wallet
//!
//! Facade over the deriver, pool, counter and synchronizer. All mutable
//! wallet state sits behind one mutex, so generation and sync never
//! interleave.
//!
//! ```text
//! generate_next_mint ──▶ counter + record ──▶ MintStore::apply
//! sync_with_chain    ──▶ ChainSynchronizer ──▶ MintStore::apply (per block)
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use hdmint_coin::{CoinAmount, IdentityToken, PrivateCoin, SerialHash};
use log::{error, info, warn};

use crate::config::WalletConfig;
use crate::error::{Result, WalletError};
use crate::hdmint::counter::MintCounter;
use crate::hdmint::pool::MintPool;
use crate::hdmint::seed::{self, MasterSeedHash};
use crate::hdmint::sync::{ChainSynchronizer, SyncReport, top_up_pool};
use crate::hdmint::{MintFilter, MintRecord, MintState, PoolEntry, builder};
use crate::ledger::{Ledger, TxOutput};
use crate::storage::{MintBatch, MintStore};

/// Mutable wallet state guarded by the wallet mutex
pub(crate) struct WalletState {
    /// `None` while the wallet is locked
    pub seed: Option<MasterSeedHash>,
    pub counter: MintCounter,
    pub pool: MintPool,
}

pub struct HdMintWallet<S, L> {
    store: Arc<S>,
    ledger: Arc<L>,
    config: WalletConfig,
    state: Mutex<WalletState>,
}

impl<S: MintStore, L: Ledger> HdMintWallet<S, L> {
    /// Open a wallet over existing storage.
    ///
    /// With a seed the wallet starts unlocked; the first seed ever supplied
    /// to a store becomes its master seed. Without one it starts locked and
    /// can only scan against the persisted pool.
    pub fn open(
        store: Arc<S>,
        ledger: Arc<L>,
        config: WalletConfig,
        seed: Option<MasterSeedHash>,
    ) -> Result<Self> {
        let counter = MintCounter::load(store.as_ref())?;
        let pool = MintPool::load(store.as_ref())?;

        let wallet = Self {
            store,
            ledger,
            config,
            state: Mutex::new(WalletState {
                seed: None,
                counter,
                pool,
            }),
        };

        if let Some(seed) = seed {
            wallet.unlock(seed)?;
            if wallet.config.resync_on_open {
                wallet.sync_with_chain(true)?;
            }
        }

        let state = wallet.state()?;
        info!(
            "HD mint wallet opened: last_used={} last_generated={}",
            state.last_used, state.last_generated
        );
        Ok(wallet)
    }

    fn guard(&self) -> Result<MutexGuard<'_, WalletState>> {
        self.state.lock().map_err(|_| WalletError::Poisoned)
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    // ========================================================================
    // Seed management
    // ========================================================================

    /// Install a master seed.
    ///
    /// A different seed starts a new lineage: the pool is rebuilt and, with
    /// `reset_counter`, indices restart from 1. Re-installing the current
    /// seed only unlocks the wallet; resetting its counter would reuse
    /// indices and is refused.
    pub fn set_seed(&self, seed: MasterSeedHash, reset_counter: bool) -> Result<()> {
        let mut state = self.guard()?;
        let fingerprint = seed.fingerprint();
        let current = self
            .store
            .get_seed_fingerprint()
            .map_err(WalletError::Store)?;

        if current == Some(fingerprint) {
            if reset_counter && state.counter.get() != 0 {
                return Err(WalletError::CounterRegression {
                    current: state.counter.get(),
                    requested: 0,
                });
            }
            state.seed = Some(seed);
            top_up_pool(&mut state, self.store.as_ref(), self.config.lookahead_window)?;
            return Ok(());
        }

        let mut counter = state.counter;
        if reset_counter {
            counter.reset();
        }

        self.store
            .apply(MintBatch {
                clear_pool: true,
                seed_fingerprint: Some(fingerprint),
                counter: Some(counter.get()),
                ..MintBatch::default()
            })
            .map_err(WalletError::Store)?;
        counter.mark_persisted();

        *state = WalletState {
            seed: Some(seed),
            counter,
            pool: MintPool::new(),
        };
        let added = top_up_pool(&mut state, self.store.as_ref(), self.config.lookahead_window)?;

        info!(
            "Master seed replaced: last_used={} pool={}",
            counter.get(),
            added
        );
        Ok(())
    }

    /// Drop the seed from memory
    pub fn lock(&self) -> Result<()> {
        self.guard()?.seed = None;
        info!("HD mint wallet locked");
        Ok(())
    }

    /// Restore the seed after checking it against the stored fingerprint
    pub fn unlock(&self, seed: MasterSeedHash) -> Result<()> {
        let mut state = self.guard()?;
        let fingerprint = seed.fingerprint();

        match self
            .store
            .get_seed_fingerprint()
            .map_err(WalletError::Store)?
        {
            Some(stored) if stored != fingerprint => return Err(WalletError::SeedMismatch),
            Some(_) => {}
            None => self
                .store
                .apply(MintBatch {
                    seed_fingerprint: Some(fingerprint),
                    ..MintBatch::default()
                })
                .map_err(WalletError::Store)?,
        }

        state.seed = Some(seed);
        top_up_pool(&mut state, self.store.as_ref(), self.config.lookahead_window)?;
        Ok(())
    }

    pub fn is_locked(&self) -> Result<bool> {
        Ok(self.guard()?.seed.is_none())
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Produce the coin for the next unused index.
    ///
    /// Indices already seen on chain are skipped. With `generate_only` the
    /// coin is returned without allocating its index, so the next call gives
    /// the same coin again.
    pub fn generate_next_mint(&self, amount: u64, generate_only: bool) -> Result<(u32, PrivateCoin)> {
        let amount = CoinAmount::new(amount)?;
        let mut state = self.guard()?;
        let master = state.seed.ok_or(WalletError::Locked)?;

        let mut counter = state.counter;
        loop {
            let index = counter.next_index()?;
            let derived = seed::derive(&master, index);

            let used = self
                .store
                .get_mint_record_by_identity(&derived.identity)
                .map_err(WalletError::Store)?
                .is_some();
            if used {
                counter.set(index)?;
                continue;
            }

            let coin = PrivateCoin::from_seed(derived.seed(), amount)?;
            if generate_only {
                return Ok((index, coin));
            }

            let entry = PoolEntry {
                index,
                identity: derived.identity,
                public_coin: coin.public_coin(),
                serial_hash: coin.serial_hash(),
            };
            counter.set(index)?;

            let mut pool = state.pool.clone();
            let mut batch = MintBatch {
                counter: Some(counter.get()),
                records: vec![MintRecord::allocated(&entry, amount.as_u64())],
                ..MintBatch::default()
            };
            if pool.insert(entry) {
                batch.pool_added.push(entry);
            }

            self.store.apply(batch).map_err(WalletError::Store)?;
            counter.mark_persisted();
            state.counter = counter;
            state.pool = pool;

            top_up_pool(&mut state, self.store.as_ref(), self.config.lookahead_window)?;
            info!("Allocated mint {} for {} units", index, amount.as_u64());
            return Ok((index, coin));
        }
    }

    /// Rebuild the coin for an index the wallet already holds a record for
    pub fn regenerate(&self, index: u32, amount: u64) -> Result<PrivateCoin> {
        let master = self.guard()?.seed.ok_or(WalletError::Locked)?;
        let derived = seed::derive(&master, index);

        let record = self
            .store
            .get_mint_record_by_identity(&derived.identity)
            .map_err(WalletError::Store)?
            .ok_or(WalletError::UnknownIndex(index))?;

        let coin = builder::build_coin(&derived, amount)?;
        if record.index != index
            || record.amount != amount
            || record.public_coin != coin.public_coin()
            || record.serial_hash != coin.serial_hash()
        {
            error!("Regenerated mint {} does not match its stored record", index);
            return Err(WalletError::RegenerationMismatch { index });
        }
        Ok(coin)
    }

    /// Output publishing `coin`, which must be the coin derived for `index`
    pub fn mint_output(&self, index: u32, coin: &PrivateCoin) -> Result<TxOutput> {
        let master = self.guard()?.seed.ok_or(WalletError::Locked)?;
        let derived = seed::derive(&master, index);
        let expected = builder::pool_entry(&derived)?;

        if expected.public_coin != coin.public_coin() {
            warn!("Coin passed for index {} was not derived from it", index);
            return Err(WalletError::RegenerationMismatch { index });
        }
        Ok(builder::mint_output(coin, derived.identity))
    }

    /// Derive any missing entries of the look-ahead window
    pub fn refill_pool(&self) -> Result<usize> {
        let mut state = self.guard()?;
        if state.seed.is_none() {
            return Err(WalletError::Locked);
        }
        top_up_pool(&mut state, self.store.as_ref(), self.config.lookahead_window)
    }

    // ========================================================================
    // Chain sync
    // ========================================================================

    /// Catch up with the ledger tip, or replay the whole chain
    pub fn sync_with_chain(&self, full_resync: bool) -> Result<SyncReport> {
        let mut state = self.guard()?;
        ChainSynchronizer::new(
            self.store.as_ref(),
            self.ledger.as_ref(),
            &self.config,
            &mut state,
        )
        .run(full_resync)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn list_mints(&self, confirmed_only: bool) -> Result<Vec<MintRecord>> {
        let filter = if confirmed_only {
            MintFilter::Confirmed
        } else {
            MintFilter::All
        };
        self.store
            .list_mint_records(filter)
            .map_err(WalletError::Store)
    }

    pub fn get_mint(&self, serial_hash: &SerialHash) -> Result<Option<MintRecord>> {
        self.store
            .get_mint_record(serial_hash)
            .map_err(WalletError::Store)
    }

    pub fn state(&self) -> Result<MintState> {
        let state = self.guard()?;
        let last_used = state.counter.get();
        Ok(MintState {
            last_used,
            last_generated: state.pool.highest_index().unwrap_or(0).max(last_used),
        })
    }

    pub fn is_in_pool(&self, identity: &IdentityToken) -> Result<bool> {
        Ok(self.guard()?.pool.contains(identity))
    }

    /// Pool entries ordered by index
    pub fn pool_entries(&self) -> Result<Vec<PoolEntry>> {
        Ok(self.guard()?.pool.entries().copied().collect())
    }
}
