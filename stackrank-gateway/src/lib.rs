//! # stackrank-gateway
//!
//! Typed client for the answer-search backend used by stackrank.
//!
//! The backend exposes four JSON endpoints: a base answer search, an
//! LLM-backed re-rank of an already-fetched answer set, a capability flag
//! saying whether re-ranking is available, and a list of recent searches.
//! This crate shapes requests, decodes responses and converts every failure
//! into a [`GatewayError`]. It holds no session state and never retries.
//!
//! ## Design
//!
//! - [`AnswerGateway`] is the seam the session layer is generic over
//! - [`HttpGateway`] implements it with a single shared `reqwest` client
//! - Answer ids are normalised to [`AnswerId`] so numeric answer ids and
//!   string ranking ids compare by value
//! - Query text is logged only at trace level

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod types;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::AnswerGateway;
pub use http::HttpGateway;
pub use types::{
    Answer, AnswerId, Owner, Query, QuestionRef, RankedAnswer, RecentSearch, RerankResponse,
    SearchResponse,
};

/// Build an [`HttpGateway`] from `config`, applying the
/// [`config::API_URL_ENV`] override first.
///
/// # Errors
///
/// Returns [`GatewayError::Config`] if the resulting configuration is invalid.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> stackrank_gateway::Result<()> {
/// use stackrank_gateway::{AnswerGateway, GatewayConfig, Query};
///
/// let gateway = stackrank_gateway::connect(GatewayConfig::default())?;
/// let response = gateway.search(&Query::new("null pointer exception")?).await?;
/// for answer in &response.answers {
///     println!("{} ({} votes)", answer.answer_id, answer.score);
/// }
/// # Ok(())
/// # }
/// ```
pub fn connect(config: GatewayConfig) -> Result<HttpGateway> {
    HttpGateway::new(&config.with_env_override())
}
