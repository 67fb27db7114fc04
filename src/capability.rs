//! One-shot, best-effort check of whether re-ranking is available.
//!
//! The probe never surfaces an error: transport failures, backend errors,
//! malformed payloads and timeouts all resolve to
//! [`Capability::Unavailable`] and are logged at debug level only. Until a
//! probe resolves the capability reads as [`Capability::Unknown`], which
//! gates the ranked view exactly like `Unavailable`.

use crate::config::RankingConfig;
use serde::{Deserialize, Serialize};
use stackrank_gateway::AnswerGateway;
use std::time::Duration;

/// Whether the ranked view may be offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// No probe has resolved yet.
    #[default]
    Unknown,
    /// The backend reported re-ranking as available.
    Available,
    /// Disabled by config, reported unavailable, or the probe failed.
    Unavailable,
}

impl Capability {
    /// Only [`Capability::Available`] unlocks the ranked view.
    pub fn is_available(self) -> bool {
        self == Self::Available
    }

    /// Whether a probe has produced a final answer.
    pub fn is_resolved(self) -> bool {
        self != Self::Unknown
    }
}

/// Runs the startup capability check against a gateway.
#[derive(Debug, Clone)]
pub struct CapabilityProbe {
    enabled: bool,
    timeout: Duration,
}

impl CapabilityProbe {
    /// Build a probe from the `[ranking]` config section.
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            enabled: config.enabled,
            timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }

    /// Probe `gateway` once.
    pub async fn run<G: AnswerGateway>(&self, gateway: &G) -> Capability {
        if !self.enabled {
            tracing::debug!("ranking disabled by config; skipping capability probe");
            return Capability::Unavailable;
        }

        match tokio::time::timeout(self.timeout, gateway.probe_capability()).await {
            Ok(Ok(true)) => {
                tracing::info!("re-ranking available");
                Capability::Available
            }
            Ok(Ok(false)) => {
                tracing::info!("re-ranking not available in this deployment");
                Capability::Unavailable
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "capability probe failed; ranking disabled");
                Capability::Unavailable
            }
            Err(_) => {
                tracing::debug!(
                    timeout_secs = self.timeout.as_secs(),
                    "capability probe timed out; ranking disabled"
                );
                Capability::Unavailable
            }
        }
    }
}
