//! Public Coin Commitments
//!
//! Implements the Poseidon commitment published by a mint output.
//!
//! ```text
//! PublicCoin = Poseidon(domain || serial || randomness)
//! ```
//!
//! The commitment hides the serial until the coin is spent.

use std::fmt;
use std::sync::LazyLock;

use ark_bls12_381::Fr;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Serialize};

/// Domain tag absorbed before the coin opening ("MINT")
const COMMIT_DOMAIN: u64 = 0x4d494e54;

/// Poseidon parameters are expensive to generate, so they are built once.
static POSEIDON: LazyLock<PoseidonConfig<Fr>> = LazyLock::new(poseidon_config);

/// The public value of a coin (32 bytes, little-endian field element)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicCoin(pub [u8; 32]);

impl PublicCoin {
    /// Commit to an opening: C = Poseidon(domain, serial, randomness)
    pub fn commit(serial: &Fr, randomness: &Fr) -> Self {
        let mut sponge = PoseidonSponge::new(&POSEIDON);

        sponge.absorb(&Fr::from(COMMIT_DOMAIN));
        sponge.absorb(serial);
        sponge.absorb(randomness);

        let result: Fr = sponge.squeeze_field_elements(1)[0];
        Self::from_field(result)
    }

    /// Create from field element
    pub fn from_field(f: Fr) -> Self {
        let bytes = f.into_bigint().to_bytes_le();
        let mut arr = [0u8; 32];
        arr[..bytes.len()].copy_from_slice(&bytes);
        Self(arr)
    }

    /// Convert to field element
    pub fn to_field(&self) -> Fr {
        Fr::from_le_bytes_mod_order(&self.0)
    }

    /// True if the bytes are the canonical encoding of a field element
    pub fn is_canonical(&self) -> bool {
        Self::from_field(self.to_field()) == *self
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for PublicCoin {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PublicCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Poseidon configuration
///
/// Field: BLS12-381 Fr (255 bits)
/// Rate: 2, Capacity: 1
fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits: u64 = 255;
    let rate: usize = 2;
    let capacity: usize = 1;
    let full_rounds: u64 = 8;
    let partial_rounds: u64 = 57;
    let alpha: u64 = 5;
    let skip_matrices: u64 = 0;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        rate,
        full_rounds,
        partial_rounds,
        skip_matrices,
    );

    PoseidonConfig::new(
        full_rounds as usize,
        partial_rounds as usize,
        alpha,
        mds,
        ark,
        rate,
        capacity,
    )
}
