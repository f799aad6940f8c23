//! Error definitions for coin construction and mint script parsing.
use thiserror::Error;

/// Errors raised while building coins or decoding mint outputs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    /// Mints must carry a positive amount
    #[error("Invalid mint amount: {0}")]
    InvalidAmount(u64),

    /// Amount exceeds the per-mint protocol limit
    #[error("Mint amount too large: {amount} exceeds maximum {max}")]
    AmountTooLarge { amount: u64, max: u64 },

    /// The seed reduced to a zero serial or zero randomness
    #[error("Derivation seed produced a degenerate coin")]
    DegenerateSeed,

    /// Script is not a well-formed mint output
    #[error("Malformed mint script: {0}")]
    MalformedScript(String),
}

/// Result type for coin operations
pub type Result<T> = std::result::Result<T, CoinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoinError::AmountTooLarge { amount: 10, max: 5 };
        assert_eq!(err.to_string(), "Mint amount too large: 10 exceeds maximum 5");

        let err = CoinError::InvalidAmount(0);
        assert_eq!(err.to_string(), "Invalid mint amount: 0");
    }
}
