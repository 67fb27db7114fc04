//! Error types for the stackrank-gateway crate.
//!
//! Every remote call resolves to one of these variants; nothing in the
//! gateway panics or propagates a transport fault unconverted. Messages are
//! stable strings suitable for logs and programmatic matching.

/// Errors that can occur while talking to the answer backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (connection refused, DNS,
    /// timeout, TLS failure, body read failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body, or the status reason if the body was empty.
        message: String,
    },

    /// The backend answered `success: false` with an explanation.
    #[error("backend error: {0}")]
    Backend(String),

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The call was rejected locally before reaching the network.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Invalid gateway configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl GatewayError {
    /// The backend's own explanation, if it gave one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend(message) => Some(message),
            _ => None,
        }
    }
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
