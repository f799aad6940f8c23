//! Mint Output Scripts
//!
//! A mint output publishes the public coin together with the identity token
//! the minting wallet derived for it.
//!
//! ```text
//! ┌──────────┬─────────────────────────┬──────────────────────┐
//! │ MINT_TAG │ PublicCoin (32 bytes)   │ IdentityToken (20)   │
//! └──────────┴─────────────────────────┴──────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::commitment::PublicCoin;
use crate::error::{CoinError, Result};

/// First byte of every mint script
pub const MINT_TAG: u8 = 0xc5;

/// Total script length: tag + public coin + identity token
pub const MINT_SCRIPT_LEN: usize = 1 + 32 + 20;

/// Short public identifier of a derived mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityToken(#[serde(with = "hex::serde")] pub [u8; 20]);

impl IdentityToken {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl AsRef<[u8]> for IdentityToken {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Decoded mint script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintScript {
    pub public_coin: PublicCoin,
    pub identity: IdentityToken,
}

impl MintScript {
    pub fn new(public_coin: PublicCoin, identity: IdentityToken) -> Self {
        Self {
            public_coin,
            identity,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut script = Vec::with_capacity(MINT_SCRIPT_LEN);
        script.push(MINT_TAG);
        script.extend_from_slice(self.public_coin.as_bytes());
        script.extend_from_slice(self.identity.as_bytes());
        script
    }

    /// Decode and validate a mint script
    pub fn parse(script: &[u8]) -> Result<Self> {
        if !is_mint_script(script) {
            return Err(CoinError::MalformedScript("missing mint tag".into()));
        }
        if script.len() != MINT_SCRIPT_LEN {
            return Err(CoinError::MalformedScript(format!(
                "expected {} bytes, got {}",
                MINT_SCRIPT_LEN,
                script.len()
            )));
        }

        let coin: [u8; 32] = script[1..33]
            .try_into()
            .map_err(|_| CoinError::MalformedScript("public coin".into()))?;
        let identity: [u8; 20] = script[33..]
            .try_into()
            .map_err(|_| CoinError::MalformedScript("identity token".into()))?;

        let public_coin = PublicCoin(coin);
        if !public_coin.is_canonical() {
            return Err(CoinError::MalformedScript(
                "public coin is not a field element".into(),
            ));
        }

        Ok(Self::new(public_coin, IdentityToken(identity)))
    }
}

/// Cheap pre-check: does this script claim to be a mint?
pub fn is_mint_script(script: &[u8]) -> bool {
    script.first() == Some(&MINT_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;

    fn sample() -> MintScript {
        let coin = PublicCoin::commit(&Fr::from(11u64), &Fr::from(12u64));
        MintScript::new(coin, IdentityToken([5u8; 20]))
    }

    #[test]
    fn test_script_shape() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), MINT_SCRIPT_LEN);
        assert!(is_mint_script(&bytes));
        assert_eq!(MintScript::parse(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_non_mint_scripts() {
        assert!(!is_mint_script(&[]));
        assert!(!is_mint_script(&[0x76, 0xa9, 0x14]));
        assert!(MintScript::parse(&[0x76]).is_err());
    }

    #[test]
    fn test_truncated_script_rejected() {
        let bytes = sample().to_bytes();
        let err = MintScript::parse(&bytes[..40]).unwrap_err();
        assert!(matches!(err, CoinError::MalformedScript(_)));
    }

    #[test]
    fn test_non_canonical_coin_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[1..33].copy_from_slice(&[0xff; 32]);
        assert!(MintScript::parse(&bytes).is_err());
    }
}
