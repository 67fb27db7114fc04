//! Error types for the stackrank session layer.

use stackrank_gateway::GatewayError;

/// Top-level error type for stackrank.
#[derive(Debug, thiserror::Error)]
pub enum StackrankError {
    /// A backend call or local request validation failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A view change was refused by the session.
    #[error("view error: {0}")]
    View(#[from] crate::session::ViewError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Host protocol error (serialization, transport framing).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A host command envelope or payload broke the contract.
    #[error("contract error: {0}")]
    Contract(#[from] crate::host::contract::ContractError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, StackrankError>;
