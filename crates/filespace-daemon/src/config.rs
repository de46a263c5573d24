//! Configuration file management.

use std::path::PathBuf;

use filespace_core::{Identity, SessionConfig};
use filespace_ledger::DEFAULT_ROW_LIMIT;
use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Who the daemon acts as.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Filespace contract settings.
    #[serde(default)]
    pub filespace: SessionConfig,
    /// Local ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Identity configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Ledger account the daemon signs as. Required.
    #[serde(default)]
    pub account_name: String,
    /// Public key that key grants for this account are addressed to.
    #[serde(default)]
    pub public_key: String,
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Database path. Empty = $data_dir/ledger.db.
    #[serde(default)]
    pub path: String,
    /// Rows returned per table fetch.
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_row_limit() -> u32 {
    DEFAULT_ROW_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            row_limit: default_row_limit(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The configured identity, or an error if no account is set.
    pub fn identity(&self) -> anyhow::Result<Identity> {
        if self.identity.account_name.is_empty() {
            anyhow::bail!(
                "identity.account_name is not set in {}",
                Self::config_path().display()
            );
        }
        Ok(Identity::new(
            self.identity.account_name.as_str(),
            self.identity.public_key.as_str(),
        ))
    }

    /// Get the ledger database path.
    pub fn ledger_path(&self) -> PathBuf {
        if self.ledger.path.is_empty() {
            Self::data_dir().join("ledger.db")
        } else {
            PathBuf::from(&self.ledger.path)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Data directory: `$FILESPACE_DATA_DIR`, else a platform default.
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("FILESPACE_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Filespace")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("Filespace")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".filespace")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/filespace"))
}
