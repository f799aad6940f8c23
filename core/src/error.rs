//! Wallet error taxonomy.
//!
//! Derivation failures come from the coin crate and are never retried.
//! Consistency failures abort the operation before anything is committed.
//! Store and ledger failures are passed through for the caller to retry.
use hdmint_coin::{CoinError, SerialHash};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    /// Coin construction failed for a derived seed
    #[error("Coin derivation failed: {0}")]
    Derivation(#[from] CoinError),

    /// The 32-bit index space is exhausted
    #[error("Mint index overflow after {0}")]
    IndexOverflow(u32),

    /// Attempt to move the counter backwards
    #[error("Counter regression: current {current}, requested {requested}")]
    CounterRegression { current: u32, requested: u32 },

    /// A matched mint's serial already exists elsewhere
    #[error("Serial collision for index {index}: {serial_hash}")]
    SerialCollision { index: u32, serial_hash: SerialHash },

    /// Regenerated coin differs from the stored record
    #[error("Regenerated coin for index {index} does not match the stored record")]
    RegenerationMismatch { index: u32 },

    /// No record exists for the requested index
    #[error("No mint record for index {0}")]
    UnknownIndex(u32),

    /// Operation needs the master seed but the wallet is locked
    #[error("Wallet is locked")]
    Locked,

    /// Supplied seed does not match the persisted fingerprint
    #[error("Master seed does not match this wallet")]
    SeedMismatch,

    /// Fork point is older than the retained block cursor
    #[error("Reorg below retained cursor at height {0}, full resync required")]
    ReorgTooDeep(u64),

    /// Ledger reported a height it cannot serve
    #[error("Ledger has no block at height {0}")]
    MissingBlock(u64),

    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[source] anyhow::Error),

    #[error("Wallet state mutex poisoned")]
    Poisoned,

    #[error("Background sync task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, WalletError>;
