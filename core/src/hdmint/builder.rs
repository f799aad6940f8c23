//! Coin Builder
//!
//! Turns derived seeds into coins, pool entries and mint outputs.

use hdmint_coin::{CoinAmount, IdentityToken, MintScript, PrivateCoin, PublicCoin, SerialHash};

use crate::error::Result;
use crate::hdmint::PoolEntry;
use crate::hdmint::seed::DerivedMint;
use crate::ledger::TxOutput;

/// Full coin opening for a derived index
pub fn build_coin(derived: &DerivedMint, amount: u64) -> Result<PrivateCoin> {
    let amount = CoinAmount::new(amount)?;
    Ok(PrivateCoin::from_seed(derived.seed(), amount)?)
}

/// Public data the wallet watches the chain for
pub fn pool_entry(derived: &DerivedMint) -> Result<PoolEntry> {
    Ok(PoolEntry {
        index: derived.index,
        identity: derived.identity,
        public_coin: PublicCoin::from_seed(derived.seed())?,
        serial_hash: SerialHash::from_seed(derived.seed())?,
    })
}

/// Output that publishes `coin` under `identity`
pub fn mint_output(coin: &PrivateCoin, identity: IdentityToken) -> TxOutput {
    TxOutput {
        value: coin.amount().as_u64(),
        script: MintScript::new(coin.public_coin(), identity).to_bytes(),
    }
}
