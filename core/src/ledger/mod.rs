//! Ledger Interface
//!
//! Read-only view of the active chain consumed by the synchronizer.
//!
//! Heights start at 0 (genesis). A block at a given height may be replaced
//! by a reorganization, so callers compare block hashes rather than trusting
//! heights alone.

pub mod memory;

pub use memory::MemoryLedger;

use anyhow::Result;
use hdmint_coin::SerialHash;

pub type BlockHash = [u8; 32];
pub type TxId = [u8; 32];

/// A transaction output: value plus locking script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub script: Vec<u8>,
}

/// A transaction as seen by the wallet.
///
/// Spends reveal the serial hash of the coin they consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub txid: TxId,
    pub outputs: Vec<TxOutput>,
    pub spent_serials: Vec<SerialHash>,
}

impl Transaction {
    /// Build a transaction, deriving its id from its contents
    pub fn new(outputs: Vec<TxOutput>, spent_serials: Vec<SerialHash>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for output in &outputs {
            hasher.update(&output.value.to_le_bytes());
            hasher.update(&(output.script.len() as u64).to_le_bytes());
            hasher.update(&output.script);
        }
        for serial in &spent_serials {
            hasher.update(serial.as_bytes());
        }

        Self {
            txid: hasher.finalize().into(),
            outputs,
            spent_serials,
        }
    }

    pub fn mint(output: TxOutput) -> Self {
        Self::new(vec![output], Vec::new())
    }

    pub fn spend(serial_hash: SerialHash) -> Self {
        Self::new(Vec::new(), vec![serial_hash])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub height: u64,
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    pub transactions: Vec<Transaction>,
}

/// Where (if anywhere) a serial has been revealed on the active chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialLookup {
    Found { height: u64, txid: TxId },
    Absent,
}

/// Source of blocks and serial status for the active chain
pub trait Ledger: Send + Sync {
    /// Height of the current tip, `None` for an empty chain
    fn tip_height(&self) -> Result<Option<u64>>;

    /// Block at `height` on the active chain
    fn block_at(&self, height: u64) -> Result<Option<Block>>;

    /// Look up a serial hash among revealed spends
    fn serial_status(&self, serial_hash: &SerialHash) -> Result<SerialLookup>;
}
