//! Trait definition for the remote answer backend.
//!
//! [`AnswerGateway`] is the seam between the session state machine and the
//! network. The production implementation is [`crate::http::HttpGateway`];
//! tests substitute scripted fakes.

use crate::error::GatewayError;
use crate::types::{Answer, Query, RecentSearch, RerankResponse, SearchResponse};

/// The remote operations the session depends on.
///
/// Each method is a single attempt with no retries. Implementations convert
/// every failure (transport, status, backend-reported, malformed payload)
/// into a [`GatewayError`] value and never panic.
///
/// All implementations must be `Send + Sync` so a session driver can share
/// one gateway between a base search and an in-flight re-rank.
pub trait AnswerGateway: Send + Sync {
    /// Run the base search for `query`.
    fn search(
        &self,
        query: &Query,
    ) -> impl std::future::Future<Output = Result<SearchResponse, GatewayError>> + Send;

    /// Score `answers` for relevance to `question`.
    ///
    /// # Errors
    ///
    /// Implementations must return [`GatewayError::Precondition`] without
    /// touching the network when `answers` is empty.
    fn rerank(
        &self,
        question: &str,
        answers: &[Answer],
    ) -> impl std::future::Future<Output = Result<RerankResponse, GatewayError>> + Send;

    /// Ask the backend whether re-ranking is available in this deployment.
    fn probe_capability(
        &self,
    ) -> impl std::future::Future<Output = Result<bool, GatewayError>> + Send;

    /// List recently submitted queries.
    fn recent_searches(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<RecentSearch>, GatewayError>> + Send;
}

/// Reject a re-rank request that would send no answers.
pub fn ensure_rerankable(answers: &[Answer]) -> Result<(), GatewayError> {
    if answers.is_empty() {
        return Err(GatewayError::Precondition(
            "cannot re-rank an empty answer set".into(),
        ));
    }
    Ok(())
}
