use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use hdmint_coin::SerialHash;

use super::{Block, BlockHash, Ledger, SerialLookup, Transaction};

/// An in-process chain with reorg support.
/// Used by the wallet tests and by embedders that feed blocks themselves.
pub struct MemoryLedger {
    chain: RwLock<Vec<Block>>,
    /// Mixed into block hashes so a replacement block never collides
    /// with the one it replaces
    nonce: AtomicU64,
}

impl MemoryLedger {
    /// A chain holding only the genesis block
    pub fn new() -> Self {
        let ledger = Self {
            chain: RwLock::new(Vec::new()),
            nonce: AtomicU64::new(0),
        };
        ledger.push_block(Vec::new());
        ledger
    }

    /// Append a block on top of the current tip
    pub fn push_block(&self, transactions: Vec<Transaction>) -> Block {
        let mut chain = match self.chain.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let (height, prev_hash) = match chain.last() {
            Some(tip) => (tip.height + 1, tip.hash),
            None => (0, [0u8; 32]),
        };
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let hash = block_hash(height, &prev_hash, nonce, &transactions);

        let block = Block {
            height,
            hash,
            prev_hash,
            transactions,
        };
        chain.push(block.clone());
        block
    }

    /// Append `count` blocks without transactions
    pub fn push_empty_blocks(&self, count: u64) {
        for _ in 0..count {
            self.push_block(Vec::new());
        }
    }

    /// Drop every block above `height`, returning them tip-first
    pub fn disconnect_above(&self, height: u64) -> Vec<Block> {
        let mut chain = match self.chain.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let keep = (height as usize + 1).min(chain.len());
        let mut removed = chain.split_off(keep);
        removed.reverse();
        removed
    }

    pub fn tip(&self) -> Option<Block> {
        self.chain.read().ok().and_then(|c| c.last().cloned())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for MemoryLedger {
    fn tip_height(&self) -> Result<Option<u64>> {
        let chain = self.chain.read().map_err(|_| anyhow!("ledger lock poisoned"))?;
        Ok(chain.last().map(|b| b.height))
    }

    fn block_at(&self, height: u64) -> Result<Option<Block>> {
        let chain = self.chain.read().map_err(|_| anyhow!("ledger lock poisoned"))?;
        Ok(chain.get(height as usize).cloned())
    }

    fn serial_status(&self, serial_hash: &SerialHash) -> Result<SerialLookup> {
        let chain = self.chain.read().map_err(|_| anyhow!("ledger lock poisoned"))?;
        for block in chain.iter() {
            for tx in &block.transactions {
                if tx.spent_serials.contains(serial_hash) {
                    return Ok(SerialLookup::Found {
                        height: block.height,
                        txid: tx.txid,
                    });
                }
            }
        }
        Ok(SerialLookup::Absent)
    }
}

fn block_hash(height: u64, prev: &BlockHash, nonce: u64, txs: &[Transaction]) -> BlockHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&height.to_le_bytes());
    hasher.update(prev);
    hasher.update(&nonce.to_le_bytes());
    for tx in txs {
        hasher.update(&tx.txid);
    }
    hasher.finalize().into()
}
