//! HD Mint Configuration
//!
//! Shared configuration crate for the HD mint wallet components.
//!
//! Handles loading configuration from:
//! 1. HDMINT_CONFIG env var (explicit path)
//! 2. ./config.toml (current directory)
//! 3. ~/.hdmint/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<HdMintConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".hdmint";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_DB_PATH: &str = "./hdmint-db";
const DEFAULT_LOOKAHEAD_WINDOW: u32 = 20;
const DEFAULT_CURSOR_DEPTH: u32 = 1000;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HdMintConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mint: MintTomlConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.into(),
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.into()
}

/// Mint generation and sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintTomlConfig {
    /// Number of future indices kept pre-derived in the mint pool
    #[serde(default = "default_lookahead_window")]
    pub lookahead_window: u32,
    /// How many processed block hashes are kept for reorg detection
    #[serde(default = "default_cursor_depth")]
    pub cursor_depth: u32,
    /// Run a full resync when the wallet is opened
    #[serde(default)]
    pub resync_on_open: bool,
}

impl Default for MintTomlConfig {
    fn default() -> Self {
        Self {
            lookahead_window: DEFAULT_LOOKAHEAD_WINDOW,
            cursor_depth: DEFAULT_CURSOR_DEPTH,
            resync_on_open: false,
        }
    }
}

fn default_lookahead_window() -> u32 {
    DEFAULT_LOOKAHEAD_WINDOW
}
fn default_cursor_depth() -> u32 {
    DEFAULT_CURSOR_DEPTH
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        if let Ok(parsed) = v.parse() {
            *field = parsed;
        }
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl HdMintConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check HDMINT_CONFIG env var
        if let Ok(path) = env::var("HDMINT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./config.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.hdmint/config.toml
        dirs::home_dir()
            .map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        env_string("HDMINT_DB_PATH", &mut self.database.path);

        env_parse("HDMINT_LOOKAHEAD", &mut self.mint.lookahead_window);
        env_parse("HDMINT_CURSOR_DEPTH", &mut self.mint.cursor_depth);
        if let Some(v) = env_bool("HDMINT_RESYNC_ON_OPEN") {
            self.mint.resync_on_open = v;
        }
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static HdMintConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: HdMintConfig) -> Result<(), HdMintConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `HdMintConfig::global()`.
#[inline]
pub fn global_config() -> &'static HdMintConfig {
    HdMintConfig::global()
}

// ============================================================================
// Tests
// ============================================================================
