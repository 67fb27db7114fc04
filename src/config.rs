//! Configuration types for stackrank.
//!
//! Loaded from TOML. Every section and field has a default, so an empty
//! file (or no file at all) yields a working local setup.

use crate::error::{Result, StackrankError};
use serde::{Deserialize, Serialize};
use stackrank_gateway::GatewayConfig;
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackrankConfig {
    /// Where the answer backend lives and how long calls may take.
    pub backend: GatewayConfig,
    /// Re-rank availability gating.
    pub ranking: RankingConfig,
    /// Snapshot presentation helpers.
    pub display: DisplayConfig,
}

/// Re-rank availability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// When `false` the backend is never probed and the ranked view is
    /// never offered.
    pub enabled: bool,
    /// Upper bound on the one-shot startup capability probe.
    pub probe_timeout_secs: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_timeout_secs: 5,
        }
    }
}

/// Presentation helper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum characters of plain text kept in a row excerpt.
    pub excerpt_chars: usize,
    /// Prefix the answer id is appended to for a row permalink.
    pub answer_link_base: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: 300,
            answer_link_base: "https://stackoverflow.com/a/".to_owned(),
        }
    }
}

impl StackrankConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| StackrankError::Config(e.to_string()))
    }

    /// Load the file at `path` if it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| StackrankError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (see [`crate::stackrank_dirs`]).
    pub fn default_config_path() -> PathBuf {
        crate::stackrank_dirs::config_file()
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`StackrankError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.backend
            .validate()
            .map_err(|e| StackrankError::Config(e.to_string()))?;
        if self.ranking.enabled && self.ranking.probe_timeout_secs == 0 {
            return Err(StackrankError::Config(
                "ranking.probe_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.display.excerpt_chars == 0 {
            return Err(StackrankError::Config(
                "display.excerpt_chars must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
