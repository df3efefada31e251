//! Search configuration
//!
//! Every run works from a [`SearchConfig`]. The built-in defaults cover the
//! usual key/certificate/VPN patterns; a TOML file can override any field:
//!
//! ```toml
//! api_base = "https://api.ipfs-search.com/v1"
//! patterns = [".pem", ".key", "ovpn"]
//! page_limit = 100
//! max_retries = 0
//! timeout_secs = 30
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.ipfs-search.com/v1";

/// The API refuses to page deeper than this.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// A failed page ends its pattern unless retries are opted into.
pub const DEFAULT_MAX_RETRIES: u32 = 0;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Filename fragments and literal markers associated with secret material
pub const DEFAULT_PATTERNS: &[&str] = &[
    "_rsa*",
    ".p12",
    ".pfx",
    ".ppk",
    "BEGIN PRIVATE KEY",
    "BEGIN OPENSSH PRIVATE KEY",
    ".key",
    ".crt",
    ".gpg",
    ".pem",
    ".pkey",
    ".priv",
    ".apps.googleusercontent.com",
    "ovpn",
];

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    /// Highest page index requested after page 0
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Extra attempts for a page whose fetch failed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}
fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            patterns: default_patterns(),
            page_limit: DEFAULT_PAGE_LIMIT,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SearchConfig {
    /// Per-request timeout for the HTTP client
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            anyhow::bail!("api_base must not be empty");
        }
        if self.patterns.is_empty() {
            anyhow::bail!("patterns must contain at least one entry");
        }
        if let Some(idx) = self.patterns.iter().position(|p| p.trim().is_empty()) {
            anyhow::bail!("patterns[{}] is blank", idx);
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be > 0");
        }
        Ok(())
    }
}

/// Load and validate a configuration file
pub fn load_config(path: &Path) -> Result<SearchConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: SearchConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.validate()?;
    Ok(config)
}
