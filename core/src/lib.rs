//! HD Mint Wallet Core
//!
//! Deterministic mint generation and chain synchronization for a
//! privacy-coin wallet.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ MintCounter  │──▶│ Seed Deriver │──▶│ Coin Builder │
//! │ (last used)  │   │ (seed, index)│   │ (PrivateCoin)│
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!        ▲                                     │
//!        │                                     ▼
//! ┌──────┴───────────────────────┐      ┌──────────────┐
//! │       ChainSynchronizer      │◀────▶│   MintPool   │
//! │ blocks ▶ matches ▶ records   │      │ (look-ahead) │
//! └──────┬───────────────┬───────┘      └──────────────┘
//!        │               │
//!        ▼               ▼
//!   ┌─────────┐     ┌─────────┐
//!   │  Ledger │     │MintStore│
//!   └─────────┘     └─────────┘
//! ```

pub mod config;
pub mod error;
pub mod hdmint;
pub mod ledger;
pub mod storage;

pub use config::WalletConfig;
pub use error::{Result, WalletError};
pub use hdmint::{
    ChainEvent, DerivedMint, HdMintWallet, MasterSeedHash, MintCounter, MintFilter, MintPool,
    MintRecord, MintState, PoolEntry, SyncReport, SyncService,
};
pub use ledger::{Block, Ledger, MemoryLedger, SerialLookup, Transaction, TxOutput};
pub use storage::{MemoryStore, MintBatch, MintStore, RocksDbStore};

#[cfg(test)]
mod tests;
