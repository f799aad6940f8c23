//! Records kept by the wallet for its deterministic mints.

use hdmint_coin::{IdentityToken, PublicCoin, SerialHash};
use serde::{Deserialize, Serialize};

use crate::ledger::TxId;

/// A pre-derived mint the wallet is watching the chain for.
///
/// Everything needed to recognise and record a match is kept here, so a
/// locked wallet can still scan blocks against its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub index: u32,
    pub identity: IdentityToken,
    pub public_coin: PublicCoin,
    pub serial_hash: SerialHash,
}

/// Durable record of a mint owned by this wallet, keyed by serial hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRecord {
    pub index: u32,
    pub identity: IdentityToken,
    pub public_coin: PublicCoin,
    pub amount: u64,
    pub serial_hash: SerialHash,
    /// Height of the block containing the mint, if seen on the active chain
    pub confirmed_height: Option<u64>,
    /// Transaction that revealed the serial
    pub spend_txid: Option<TxId>,
}

impl MintRecord {
    /// Record for a mint that was observed in a block
    pub fn confirmed(entry: &PoolEntry, amount: u64, height: u64) -> Self {
        Self {
            index: entry.index,
            identity: entry.identity,
            public_coin: entry.public_coin,
            amount,
            serial_hash: entry.serial_hash,
            confirmed_height: Some(height),
            spend_txid: None,
        }
    }

    /// Record for a mint this wallet allocated but has not seen yet
    pub fn allocated(entry: &PoolEntry, amount: u64) -> Self {
        Self {
            confirmed_height: None,
            ..Self::confirmed(entry, amount, 0)
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_height.is_some()
    }

    pub fn is_spent(&self) -> bool {
        self.spend_txid.is_some()
    }

    /// Pool entry that watches for this record's mint again
    pub fn pool_entry(&self) -> PoolEntry {
        PoolEntry {
            index: self.index,
            identity: self.identity,
            public_coin: self.public_coin,
            serial_hash: self.serial_hash,
        }
    }
}

/// Which records `list_mint_records` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MintFilter {
    #[default]
    All,
    Confirmed,
    /// Confirmed and not yet linked to a spend
    Unspent,
}

impl MintFilter {
    pub fn matches(&self, record: &MintRecord) -> bool {
        match self {
            MintFilter::All => true,
            MintFilter::Confirmed => record.is_confirmed(),
            MintFilter::Unspent => record.is_confirmed() && !record.is_spent(),
        }
    }
}

/// Snapshot of the wallet's generation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintState {
    /// Highest index handed out or observed on chain
    pub last_used: u32,
    /// Highest index currently pre-derived in the pool
    pub last_generated: u32,
}
