//! Wallet Configuration
//!
//! Runtime settings for the wallet, built from the shared `hdmint-config`
//! crate (TOML file plus environment overrides).

use hdmint_config::HdMintConfig;

/// Settings consumed by the wallet and synchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    /// Indices kept pre-derived above the counter
    pub lookahead_window: u32,
    /// Processed block hashes retained for reorg detection (0 keeps all)
    pub cursor_depth: u32,
    /// Replay the whole chain when the wallet is opened with a seed
    pub resync_on_open: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self::from(&HdMintConfig::default())
    }
}

impl From<&HdMintConfig> for WalletConfig {
    fn from(config: &HdMintConfig) -> Self {
        Self {
            lookahead_window: config.mint.lookahead_window,
            cursor_depth: config.mint.cursor_depth,
            resync_on_open: config.mint.resync_on_open,
        }
    }
}

impl WalletConfig {
    /// Settings from the process-wide configuration
    pub fn from_global() -> Self {
        Self::from(hdmint_config::global_config())
    }

    pub fn with_lookahead(mut self, window: u32) -> Self {
        self.lookahead_window = window;
        self
    }
}
