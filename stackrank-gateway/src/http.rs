//! HTTP implementation of [`AnswerGateway`] over the backend JSON API.
//!
//! All endpoints live under `<base_url>/api/`:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | search | `POST search {query}` |
//! | rerank | `POST re-rank {question, answers}` |
//! | capability | `GET llm-status` |
//! | recent | `GET recent` |
//!
//! Every response carries a `success` flag. `success: false` becomes
//! [`GatewayError::Backend`]; non-2xx statuses become
//! [`GatewayError::Status`]; bodies that do not decode become
//! [`GatewayError::Malformed`].

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{AnswerGateway, ensure_rerankable};
use crate::types::{Answer, Query, RankedAnswer, RecentSearch, RerankResponse, SearchResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Longest slice of an error body carried into [`GatewayError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Build a [`reqwest::Client`] configured for the answer backend.
///
/// # Errors
///
/// Returns [`GatewayError::Config`] if the client cannot be constructed.
pub fn build_client(config: &GatewayConfig) -> Result<reqwest::Client, GatewayError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => default_user_agent(),
    };

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .build()
        .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))
}

/// `stackrank-gateway/<crate version>`.
pub fn default_user_agent() -> String {
    format!("stackrank-gateway/{}", env!("CARGO_PKG_VERSION"))
}

/// Resolve the API root (`<base_url>/api/`) from a configured base URL.
///
/// A trailing slash on `base_url` is optional; a path prefix is preserved.
pub fn api_root(base_url: &str) -> Result<Url, GatewayError> {
    let mut base = Url::parse(base_url)
        .map_err(|e| GatewayError::Config(format!("base_url is not a valid URL: {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/")
        .map_err(|e| GatewayError::Config(format!("cannot derive API root: {e}")))
}

// ── Wire format ────────────────────────────────────────────────

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    question: &'a str,
    answers: &'a [Answer],
}

#[derive(Deserialize)]
struct SearchEnvelope {
    success: bool,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    answers: Option<Vec<Answer>>,
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    suggestions: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RerankEnvelope {
    success: bool,
    #[serde(default)]
    ranked_answers: Option<Vec<RankedAnswer>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    success: bool,
    #[serde(default)]
    llm_available: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct RecentEnvelope {
    success: bool,
    #[serde(default)]
    recent_searches: Option<Vec<RecentSearch>>,
    #[serde(default)]
    error: Option<String>,
}

/// Error bodies some backends attach to non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn backend_error(message: Option<String>, fallback: &str) -> GatewayError {
    GatewayError::Backend(
        message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_owned()),
    )
}

// ── Gateway ────────────────────────────────────────────────────

/// [`AnswerGateway`] backed by the backend's HTTP JSON API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    api_root: Url,
}

impl HttpGateway {
    /// Create a gateway from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self {
            client: build_client(config)?,
            api_root: api_root(&config.base_url)?,
        })
    }

    /// The resolved API root every endpoint is joined onto.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.api_root
            .join(path)
            .map_err(|e| GatewayError::Config(format!("invalid endpoint `{path}`: {e}")))
    }

    /// Send `request`, enforce a 2xx status and decode the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let started = std::time::Instant::now();
        let response = request.send().await.map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        tracing::debug!(
            endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "backend responded"
        );

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(ErrorBody {
                    error: Some(msg), ..
                })
                | Ok(ErrorBody {
                    message: Some(msg), ..
                }) => msg,
                _ => {
                    let text: String = String::from_utf8_lossy(&body)
                        .chars()
                        .take(MAX_ERROR_BODY_CHARS)
                        .collect();
                    if text.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("unknown status")
                            .to_owned()
                    } else {
                        text
                    }
                }
            };
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| GatewayError::Malformed(format!("{endpoint}: {e}")))
    }
}

/// Map a transport-level reqwest failure to a [`GatewayError`].
fn classify_reqwest_error(e: &reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Transport("request timed out".into())
    } else if e.is_connect() {
        GatewayError::Transport(format!("connection failed: {e}"))
    } else {
        GatewayError::Transport(e.to_string())
    }
}

impl AnswerGateway for HttpGateway {
    async fn search(&self, query: &Query) -> Result<SearchResponse, GatewayError> {
        tracing::trace!(query = %query, "search request");
        let url = self.endpoint("search")?;
        let envelope: SearchEnvelope = self
            .send_json(
                "search",
                self.client.post(url).json(&SearchRequest {
                    query: query.as_str(),
                }),
            )
            .await?;

        if !envelope.success {
            return Err(backend_error(envelope.error, "Search failed"));
        }
        let answers = envelope
            .answers
            .ok_or_else(|| GatewayError::Malformed("search: missing `answers`".into()))?;
        let total = envelope.total.unwrap_or(answers.len());
        tracing::debug!(count = answers.len(), total, "search succeeded");

        Ok(SearchResponse {
            query: envelope.query.unwrap_or_else(|| query.to_string()),
            answers,
            total,
            suggestions: envelope.suggestions.unwrap_or_default(),
        })
    }

    async fn rerank(
        &self,
        question: &str,
        answers: &[Answer],
    ) -> Result<RerankResponse, GatewayError> {
        ensure_rerankable(answers)?;
        tracing::trace!(question, count = answers.len(), "re-rank request");
        let url = self.endpoint("re-rank")?;
        let envelope: RerankEnvelope = self
            .send_json(
                "re-rank",
                self.client
                    .post(url)
                    .json(&RerankRequest { question, answers }),
            )
            .await?;

        if !envelope.success {
            return Err(backend_error(envelope.error, "Re-ranking failed"));
        }
        let ranked = envelope
            .ranked_answers
            .ok_or_else(|| GatewayError::Malformed("re-rank: missing `ranked_answers`".into()))?;
        tracing::debug!(count = ranked.len(), "re-rank succeeded");
        Ok(RerankResponse { ranked })
    }

    async fn probe_capability(&self) -> Result<bool, GatewayError> {
        let url = self.endpoint("llm-status")?;
        let envelope: StatusEnvelope = self.send_json("llm-status", self.client.get(url)).await?;

        if !envelope.success {
            return Err(backend_error(envelope.message, "status check failed"));
        }
        envelope
            .llm_available
            .ok_or_else(|| GatewayError::Malformed("llm-status: missing `llm_available`".into()))
    }

    async fn recent_searches(&self) -> Result<Vec<RecentSearch>, GatewayError> {
        let url = self.endpoint("recent")?;
        let envelope: RecentEnvelope = self.send_json("recent", self.client.get(url)).await?;

        if !envelope.success {
            return Err(backend_error(envelope.error, "failed to load recent searches"));
        }
        Ok(envelope.recent_searches.unwrap_or_default())
    }
}
