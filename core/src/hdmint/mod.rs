//! Deterministic (HD) mint generation.
//!
//! Every coin the wallet mints is derived from the master seed hash and a
//! 32-bit index, so the full set of mints can be rebuilt from the seed and
//! the chain alone.

pub mod builder;
pub mod counter;
pub mod pool;
pub mod seed;
pub mod service;
pub mod sync;
pub mod types;
pub mod wallet;

pub use counter::MintCounter;
pub use pool::MintPool;
pub use seed::{DerivedMint, MasterSeedHash};
pub use service::{ChainEvent, SyncCommand, SyncService, spawn_full_resync};
pub use sync::SyncReport;
pub use types::{MintFilter, MintRecord, MintState, PoolEntry};
pub use wallet::HdMintWallet;
