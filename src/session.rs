//! Search session state machine.
//!
//! A session runs on two orthogonal axes:
//!
//! ```text
//! search:  Idle ──submit──► Searching ──ok──► ResultsReady
//!                               │
//!                               └──err──► Idle (+ error)
//!
//! ranking: None ──select Ranked──► Loading ──ok──► Ready
//!                                     │
//!                                     └──err──► Failed
//! ```
//!
//! Every submission replaces the whole [`SessionState`] and bumps the
//! generation. Network calls happen outside the session: a transition hands
//! out a ticket, the caller performs the fetch, and the completion is applied
//! only if the ticket's generation is still current. This lets a driver
//! release its lock across the await and discard late results from
//! superseded queries.
//!
//! The ranking fetch is lazy and happens at most once per generation: only
//! the `None → Loading` transition issues a [`RerankTicket`]. From
//! `Loading`, `Ready` or `Failed`, selecting the ranked view just flips the
//! view flag.

use crate::capability::Capability;
use crate::config::DisplayConfig;
use crate::merger::{self, DisplayEntry, ViewMode};
use crate::present;
use serde::{Deserialize, Serialize};
use stackrank_gateway::{
    Answer, AnswerId, GatewayError, Query, RankedAnswer, RerankResponse, SearchResponse,
};

/// Shown when a base search fails for any reason other than a
/// backend-supplied message.
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search. Please try again.";

/// Advisory shown when re-ranking fails; the original order stays visible.
pub const RANKING_FAILED_MESSAGE: &str = "Failed to get AI ranking. Using original order.";

/// Base search axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    ResultsReady,
}

/// Ranking axis. Orthogonal to [`SearchPhase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPhase {
    /// No ranking requested for this generation.
    #[default]
    None,
    Loading,
    Ready,
    Failed,
}

/// Whether a completion changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Applied,
    /// The ticket belonged to a superseded generation, or the phase it
    /// completes is no longer pending.
    Stale,
}

/// Why a view change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("AI ranking is not available")]
    RankingUnavailable,
    #[error("no search results to rank yet")]
    ResultsNotReady,
    #[error("there are no answers to rank")]
    NoAnswers,
}

/// A failed fetch: the user-facing message plus the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub cause: GatewayError,
}

/// Permission to run one base search for one generation.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    query: Query,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

/// Permission to run the single re-rank of one generation.
#[derive(Debug, Clone)]
pub struct RerankTicket {
    generation: u64,
    question: String,
    answers: Vec<Answer>,
}

impl RerankTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Display title the ranking is requested for.
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }
}

/// Everything that belongs to one query generation.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    generation: u64,
    query: Option<Query>,
    display_title: String,
    answers: Vec<Answer>,
    total: usize,
    suggestions: Vec<String>,
    ranked: Vec<RankedAnswer>,
    view: ViewMode,
    search_phase: SearchPhase,
    rank_phase: RankPhase,
    search_failure: Option<FetchFailure>,
    rank_failure: Option<FetchFailure>,
}

impl SessionState {
    fn searching(generation: u64, query: Query) -> Self {
        Self {
            generation,
            display_title: query.to_string(),
            query: Some(query),
            search_phase: SearchPhase::Searching,
            ..Self::default()
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    /// Parent question title of the first answer, else the query text.
    pub fn display_title(&self) -> &str {
        &self.display_title
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Backend-reported total match count.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Ranking entries for the current answers; empty until `Ready`.
    pub fn ranked(&self) -> &[RankedAnswer] {
        &self.ranked
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn search_phase(&self) -> SearchPhase {
        self.search_phase
    }

    pub fn rank_phase(&self) -> RankPhase {
        self.rank_phase
    }

    pub fn search_failure(&self) -> Option<&FetchFailure> {
        self.search_failure.as_ref()
    }

    pub fn rank_failure(&self) -> Option<&FetchFailure> {
        self.rank_failure.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.search_phase == SearchPhase::Searching
    }

    pub fn is_ranking(&self) -> bool {
        self.rank_phase == RankPhase::Loading
    }

    /// The error to show, if any. A search failure outranks a ranking advisory.
    pub fn error_text(&self) -> Option<&str> {
        self.search_failure
            .as_ref()
            .or(self.rank_failure.as_ref())
            .map(|f| f.message.as_str())
    }
}

/// The search-and-rank state machine for one presentation surface.
#[derive(Debug, Default)]
pub struct SearchSession {
    state: SessionState,
    capability: Capability,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Record the capability probe's verdict.
    ///
    /// Only the first resolved verdict sticks; later calls are ignored and
    /// return `false`.
    pub fn resolve_capability(&mut self, capability: Capability) -> bool {
        if self.capability.is_resolved() || !capability.is_resolved() {
            return false;
        }
        tracing::debug!(?capability, "capability resolved");
        self.capability = capability;
        true
    }

    /// Start a new generation for `query`.
    ///
    /// Valid from any state. The previous state, including any ranking and
    /// errors, is discarded and the view resets to [`ViewMode::Original`].
    pub fn begin_search(&mut self, query: Query) -> SearchTicket {
        let generation = self.state.generation.wrapping_add(1);
        tracing::debug!(generation, "search started");
        tracing::trace!(query = %query, generation, "search query");
        self.state = SessionState::searching(generation, query.clone());
        SearchTicket { generation, query }
    }

    /// Apply the outcome of the base search issued by `ticket`.
    pub fn complete_search(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<SearchResponse, GatewayError>,
    ) -> Completion {
        if ticket.generation != self.state.generation
            || self.state.search_phase != SearchPhase::Searching
        {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.state.generation,
                "discarding stale search result"
            );
            return Completion::Stale;
        }

        match outcome {
            Ok(response) => {
                self.state.display_title = response
                    .answers
                    .first()
                    .and_then(Answer::question_title)
                    .unwrap_or(ticket.query.as_str())
                    .to_owned();
                self.state.total = response.total;
                self.state.suggestions = response.suggestions;
                self.state.answers = response.answers;
                self.state.search_phase = SearchPhase::ResultsReady;
                tracing::info!(
                    generation = ticket.generation,
                    count = self.state.answers.len(),
                    "search results ready"
                );
            }
            Err(cause) => {
                tracing::warn!(generation = ticket.generation, error = %cause, "search failed");
                let message = cause
                    .backend_message()
                    .unwrap_or(SEARCH_FAILED_MESSAGE)
                    .to_owned();
                self.state.answers.clear();
                self.state.total = 0;
                self.state.search_phase = SearchPhase::Idle;
                self.state.search_failure = Some(FetchFailure { message, cause });
            }
        }
        Completion::Applied
    }

    /// Switch the presented ordering.
    ///
    /// Returns a [`RerankTicket`] only when this call is the one that must
    /// fetch the ranking; the caller runs the fetch and reports back through
    /// [`SearchSession::complete_rerank`].
    ///
    /// # Errors
    ///
    /// Selecting [`ViewMode::Ranked`] is refused when the capability is not
    /// available, results are not ready, or there are no answers. The view
    /// is left unchanged in that case.
    pub fn select_view(&mut self, view: ViewMode) -> Result<Option<RerankTicket>, ViewError> {
        if view == ViewMode::Original {
            self.state.view = ViewMode::Original;
            return Ok(None);
        }

        if !self.capability.is_available() {
            return Err(ViewError::RankingUnavailable);
        }
        if self.state.search_phase != SearchPhase::ResultsReady {
            return Err(ViewError::ResultsNotReady);
        }
        if self.state.answers.is_empty() {
            return Err(ViewError::NoAnswers);
        }

        self.state.view = ViewMode::Ranked;
        if self.state.rank_phase != RankPhase::None {
            return Ok(None);
        }

        self.state.rank_phase = RankPhase::Loading;
        tracing::debug!(generation = self.state.generation, "ranking requested");
        Ok(Some(RerankTicket {
            generation: self.state.generation,
            question: self.state.display_title.clone(),
            answers: self.state.answers.clone(),
        }))
    }

    /// Apply the outcome of the re-rank issued by `ticket`.
    ///
    /// A failure leaves the view on [`ViewMode::Ranked`]; the merge falls
    /// back to original order while no ranking is stored.
    pub fn complete_rerank(
        &mut self,
        ticket: &RerankTicket,
        outcome: Result<RerankResponse, GatewayError>,
    ) -> Completion {
        if ticket.generation != self.state.generation
            || self.state.rank_phase != RankPhase::Loading
        {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.state.generation,
                "discarding stale ranking result"
            );
            return Completion::Stale;
        }

        match outcome {
            Ok(response) => {
                let received = response.ranked.len();
                self.state.ranked = merger::retain_known(&self.state.answers, response.ranked);
                self.state.rank_phase = RankPhase::Ready;
                tracing::info!(
                    generation = ticket.generation,
                    received,
                    kept = self.state.ranked.len(),
                    "ranking ready"
                );
            }
            Err(cause) => {
                tracing::warn!(generation = ticket.generation, error = %cause, "ranking failed");
                self.state.rank_phase = RankPhase::Failed;
                self.state.rank_failure = Some(FetchFailure {
                    message: RANKING_FAILED_MESSAGE.to_owned(),
                    cause,
                });
            }
        }
        Completion::Applied
    }

    /// Current rows in display order.
    pub fn display(&self) -> Vec<DisplayEntry<'_>> {
        merger::merge(&self.state.answers, &self.state.ranked, self.state.view)
    }

    /// Owned copy of everything a presentation layer needs.
    pub fn snapshot(&self, display: &DisplayConfig) -> SessionSnapshot {
        let state = &self.state;
        let rows = self
            .display()
            .into_iter()
            .map(|entry| DisplayRow {
                excerpt: present::excerpt(&entry.answer.body, display.excerpt_chars),
                created: present::format_creation_date(entry.answer.creation_date),
                permalink: present::permalink(&display.answer_link_base, entry.answer.answer_id),
                answer: entry.answer.clone(),
                ranking: entry.ranking.cloned(),
            })
            .collect();

        SessionSnapshot {
            generation: state.generation,
            query: state.query.as_ref().map(ToString::to_string),
            display_title: state.display_title.clone(),
            answer_count: state.answers.len(),
            total: state.total,
            suggestions: state.suggestions.clone(),
            original_order: state.answers.iter().map(|a| a.answer_id).collect(),
            rows,
            view: state.view,
            search_phase: state.search_phase,
            rank_phase: state.rank_phase,
            searching: state.is_searching(),
            ranking: state.is_ranking(),
            error: state.error_text().map(str::to_owned),
            capability: self.capability,
            ranking_available: self.capability.is_available(),
        }
    }
}

/// One presented answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub answer: Answer,
    pub ranking: Option<RankedAnswer>,
    /// Plain-text excerpt of the body.
    pub excerpt: String,
    /// Creation date as `YYYY-MM-DD`.
    pub created: Option<String>,
    pub permalink: String,
}

/// Point-in-time view of a session, safe to hand to another task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub query: Option<String>,
    pub display_title: String,
    pub answer_count: usize,
    pub total: usize,
    pub suggestions: Vec<String>,
    /// Answer ids in base search order.
    pub original_order: Vec<AnswerId>,
    /// Rows in display order for `view`.
    pub rows: Vec<DisplayRow>,
    pub view: ViewMode,
    pub search_phase: SearchPhase,
    pub rank_phase: RankPhase,
    pub searching: bool,
    pub ranking: bool,
    pub error: Option<String>,
    pub capability: Capability,
    pub ranking_available: bool,
}

impl SessionSnapshot {
    /// Answer ids in display order.
    pub fn display_order(&self) -> Vec<AnswerId> {
        self.rows.iter().map(|row| row.answer.answer_id).collect()
    }
}
