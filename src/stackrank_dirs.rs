//! Application directory paths for stackrank.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/stackrank/` | `~/.config/stackrank/` |
//!
//! `STACKRANK_CONFIG_DIR` overrides [`config_dir`] for tests and custom
//! deployments.

use std::path::PathBuf;

/// Environment variable overriding [`config_dir`].
pub const CONFIG_DIR_ENV: &str = "STACKRANK_CONFIG_DIR";

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/stackrank/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("stackrank"))
        .unwrap_or_else(|| PathBuf::from("/tmp/stackrank-config"))
}

/// Path to `config.toml` inside [`config_dir`].
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
