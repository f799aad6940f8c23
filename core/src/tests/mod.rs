mod generation;
mod sync;

use std::sync::Arc;

use hdmint_coin::{IdentityToken, PrivateCoin, SerialHash};

use crate::config::WalletConfig;
use crate::hdmint::{HdMintWallet, MasterSeedHash, builder, seed};
use crate::ledger::{MemoryLedger, Transaction};
use crate::storage::MemoryStore;

pub(crate) type MemWallet = HdMintWallet<MemoryStore, MemoryLedger>;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn master(fill: u8) -> MasterSeedHash {
    MasterSeedHash::from_bytes([fill; 20])
}

pub(crate) fn config(window: u32) -> WalletConfig {
    WalletConfig {
        lookahead_window: window,
        cursor_depth: 1000,
        resync_on_open: false,
    }
}

/// A wallet over fresh in-memory storage, unlocked with `master(1)`
pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<MemoryLedger>,
    pub wallet: MemWallet,
}

pub(crate) fn harness(window: u32) -> Harness {
    harness_with(config(window), Arc::new(MemoryLedger::new()))
}

pub(crate) fn harness_with(config: WalletConfig, ledger: Arc<MemoryLedger>) -> Harness {
    init_logger();
    let store = Arc::new(MemoryStore::new());
    let wallet = HdMintWallet::open(store.clone(), ledger.clone(), config, Some(master(1))).unwrap();
    Harness {
        store,
        ledger,
        wallet,
    }
}

pub(crate) fn identity(seed: &MasterSeedHash, index: u32) -> IdentityToken {
    seed::derive(seed, index).identity
}

pub(crate) fn coin(seed: &MasterSeedHash, index: u32, amount: u64) -> PrivateCoin {
    builder::build_coin(&seed::derive(seed, index), amount).unwrap()
}

pub(crate) fn serial(seed: &MasterSeedHash, index: u32) -> SerialHash {
    coin(seed, index, 1).serial_hash()
}

/// Transaction publishing the mint for `index` under `seed`
pub(crate) fn mint_tx(seed: &MasterSeedHash, index: u32, amount: u64) -> Transaction {
    let derived = seed::derive(seed, index);
    let coin = builder::build_coin(&derived, amount).unwrap();
    Transaction::mint(builder::mint_output(&coin, derived.identity))
}
