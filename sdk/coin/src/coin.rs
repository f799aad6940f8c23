//! Private Coins
//!
//! A PrivateCoin is the full opening needed to spend a mint.
//!
//! ```text
//! PrivateCoin = {
//!     amount: u64,           // Value in the smallest unit
//!     serial: [u8; 32],      // Revealed at spend time
//!     randomness: [u8; 32],  // Blinding factor
//!     public: PublicCoin,    // Poseidon(serial, randomness)
//! }
//! ```
//!
//! Coins are never sampled at random here: every coin comes from a 512-bit
//! derivation seed so it can be rebuilt from the wallet seed alone.

use ark_bls12_381::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};

use crate::commitment::PublicCoin;
use crate::error::{CoinError, Result};
use crate::serial::{SerialHash, SerialNumber};

/// Smallest units per coin
pub const COIN: u64 = 100_000_000;

/// Largest amount a single mint may carry
pub const MAX_MINT_AMOUNT: u64 = 5_001 * COIN;

/// Mint amount with protocol bounds enforced at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoinAmount(u64);

impl CoinAmount {
    pub fn new(amount: u64) -> Result<Self> {
        if amount == 0 {
            return Err(CoinError::InvalidAmount(amount));
        }
        if amount > MAX_MINT_AMOUNT {
            return Err(CoinError::AmountTooLarge {
                amount,
                max: MAX_MINT_AMOUNT,
            });
        }
        Ok(Self(amount))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A spendable coin opening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateCoin {
    amount: CoinAmount,
    serial: SerialNumber,
    randomness: [u8; 32],
    public: PublicCoin,
}

impl PrivateCoin {
    /// Build the coin for a derivation seed and amount
    pub fn from_seed(seed: &[u8; 64], amount: CoinAmount) -> Result<Self> {
        let (serial, randomness) = opening_from_seed(seed)?;
        let public = PublicCoin::commit(&serial, &randomness);

        Ok(Self {
            amount,
            serial: SerialNumber::from_field(serial),
            randomness: field_bytes(randomness),
            public,
        })
    }

    pub fn amount(&self) -> CoinAmount {
        self.amount
    }

    pub fn serial(&self) -> &SerialNumber {
        &self.serial
    }

    pub fn serial_hash(&self) -> SerialHash {
        self.serial.hash()
    }

    pub fn randomness(&self) -> &[u8; 32] {
        &self.randomness
    }

    pub fn public_coin(&self) -> PublicCoin {
        self.public
    }
}

impl PublicCoin {
    /// Public value of the coin a seed opens, without choosing an amount
    pub fn from_seed(seed: &[u8; 64]) -> Result<Self> {
        let (serial, randomness) = opening_from_seed(seed)?;
        Ok(Self::commit(&serial, &randomness))
    }
}

impl SerialHash {
    /// Serial hash of the coin a seed opens
    pub fn from_seed(seed: &[u8; 64]) -> Result<Self> {
        let (serial, _) = opening_from_seed(seed)?;
        Ok(SerialNumber::from_field(serial).hash())
    }
}

fn field_bytes(f: Fr) -> [u8; 32] {
    let bytes = f.into_bigint().to_bytes_le();
    let mut arr = [0u8; 32];
    arr[..bytes.len()].copy_from_slice(&bytes);
    arr
}

/// Split a derivation seed into (serial, randomness) scalars
fn opening_from_seed(seed: &[u8; 64]) -> Result<(Fr, Fr)> {
    let serial = Fr::from_le_bytes_mod_order(blake3::hash(&seed[..32]).as_bytes());
    let randomness = Fr::from_le_bytes_mod_order(&seed[32..]);

    if serial.is_zero() || randomness.is_zero() {
        return Err(CoinError::DegenerateSeed);
    }
    Ok((serial, randomness))
}
