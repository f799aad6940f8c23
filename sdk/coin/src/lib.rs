//! HD Mint Coin Primitives
//!
//! Deterministic private coins for the HD mint wallet.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 512-bit derivation seed                         │
//! │        ┌──────────────────┴──────────────────┐                  │
//! │        ▼                                     ▼                  │
//! │  ┌──────────────┐                    ┌──────────────┐           │
//! │  │ seed[0..32]  │ blake3 → Fr        │ seed[32..64] │ → Fr      │
//! │  │   serial     │                    │  randomness  │           │
//! │  └──────────────┘                    └──────────────┘           │
//! │        │                                     │                  │
//! │        ├──────────────┬──────────────────────┘                  │
//! │        ▼              ▼                                         │
//! │  ┌───────────┐  ┌──────────────────────────────┐                │
//! │  │SerialHash │  │ PublicCoin = Poseidon(s, r)  │ → mint script  │
//! │  │ (at spend)│  │ (published at mint)          │                │
//! │  └───────────┘  └──────────────────────────────┘                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The amount travels in the output value, so the public coin of an index is
//! known before the amount is chosen.

pub mod coin;
pub mod commitment;
pub mod error;
pub mod script;
pub mod serial;

pub use coin::{COIN, CoinAmount, MAX_MINT_AMOUNT, PrivateCoin};
pub use commitment::PublicCoin;
pub use error::{CoinError, Result};
pub use script::{IdentityToken, MINT_SCRIPT_LEN, MINT_TAG, MintScript, is_mint_script};
pub use serial::{SerialHash, SerialNumber};
