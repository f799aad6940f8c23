//! Seed Deriver
//!
//! Maps (master seed hash, index) to the identity token and 512-bit
//! derivation seed of one mint. Pure and deterministic: the same inputs give
//! the same outputs on every machine.
//!
//! ```text
//! child    = HKDF-SHA256(salt = SEED_SALT, ikm = master, info = INFO || index_be)
//! identity = blake3(ed25519_pubkey(child))[..20]
//! seed     = SHA-512(child)
//! ```

use std::fmt;

use ed25519_dalek::SigningKey;
use hdmint_coin::IdentityToken;
use hkdf::Hkdf;
use sha2::{Digest, Sha256, Sha512};

const SEED_SALT: &[u8] = b"hdmint-seed-v1";
const SEED_INFO: &[u8] = b"hdmint/mint/";
const FINGERPRINT_CONTEXT: &str = "hdmint 2024 master seed fingerprint";

/// Hash of the wallet's master seed, the root of every derived mint.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MasterSeedHash([u8; 20]);

impl MasterSeedHash {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Public fingerprint persisted to recognise the seed on unlock
    pub fn fingerprint(&self) -> [u8; 32] {
        blake3::derive_key(FINGERPRINT_CONTEXT, &self.0)
    }
}

impl fmt::Debug for MasterSeedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterSeedHash({})", hex::encode(&self.fingerprint()[..4]))
    }
}

/// Output of the deriver for one index
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedMint {
    pub index: u32,
    pub identity: IdentityToken,
    seed: [u8; 64],
}

impl DerivedMint {
    pub fn seed(&self) -> &[u8; 64] {
        &self.seed
    }
}

impl fmt::Debug for DerivedMint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedMint")
            .field("index", &self.index)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Derive the identity and coin seed for `index`
pub fn derive(master: &MasterSeedHash, index: u32) -> DerivedMint {
    let hk = Hkdf::<Sha256>::new(Some(SEED_SALT), master.as_bytes());

    let mut info = [0u8; SEED_INFO.len() + 4];
    info[..SEED_INFO.len()].copy_from_slice(SEED_INFO);
    info[SEED_INFO.len()..].copy_from_slice(&index.to_be_bytes());

    let mut child = [0u8; 32];
    hk.expand(&info, &mut child).expect("HKDF expansion failed");

    let verifying = SigningKey::from_bytes(&child).verifying_key();
    let digest = blake3::hash(verifying.as_bytes());
    let mut identity = [0u8; 20];
    identity.copy_from_slice(&digest.as_bytes()[..20]);

    let mut seed = [0u8; 64];
    seed.copy_from_slice(&Sha512::digest(child));

    DerivedMint {
        index,
        identity: IdentityToken(identity),
        seed,
    }
}
