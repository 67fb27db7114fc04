//! Core types for answers, rankings and backend responses.

use crate::error::GatewayError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A trimmed, non-empty search query.
///
/// Construction is the only validation point: every `Query` in the system
/// is known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query(String);

impl Query {
    /// Trim `raw` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Precondition`] if the trimmed text is empty.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, GatewayError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GatewayError::Precondition("query must not be empty".into()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The query text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Query {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Query> for String {
    fn from(value: Query) -> Self {
        value.0
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical answer identity.
///
/// Answers carry it as a JSON number; ranking entries carry it as a string.
/// Both are normalised to this type before any comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerId(pub u64);

impl AnswerId {
    /// Parse the string form used by ranking entries. Surrounding whitespace
    /// is ignored; anything that is not a non-negative integer yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().map(Self)
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Public display name.
    #[serde(default)]
    pub display_name: String,
    /// Optional profile link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// The question an answer belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub question_id: u64,
    pub title: String,
    #[serde(default)]
    pub link: String,
}

/// A single answer returned by the base search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer_id: AnswerId,
    /// Raw markup as stored by the corpus.
    pub body: String,
    /// Community vote score.
    pub score: i64,
    #[serde(default)]
    pub is_accepted: bool,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub creation_date: i64,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionRef>,
}

impl Answer {
    /// Title of the parent question, if the backend supplied one.
    pub fn question_title(&self) -> Option<&str> {
        self.question
            .as_ref()
            .map(|q| q.title.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

/// A relevance judgement for one answer, produced by the re-rank backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAnswer {
    /// String form of the ranked answer's id. Accepts JSON numbers too.
    #[serde(deserialize_with = "string_or_number")]
    pub answer_id: String,
    /// Relevance score, open range, higher is more relevant.
    pub score: f64,
    /// Free-text justification.
    #[serde(default)]
    pub reason: String,
}

impl RankedAnswer {
    /// The id normalised to [`AnswerId`], or `None` if it is not numeric.
    pub fn canonical_id(&self) -> Option<AnswerId> {
        AnswerId::parse(&self.answer_id)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
    })
}

/// A previously submitted query, as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSearch {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub query: String,
    /// Backend timestamp, passed through untouched.
    #[serde(default)]
    pub inserted_at: String,
}

/// Successful base search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Query as echoed by the backend (falls back to the submitted text).
    pub query: String,
    /// Answers in corpus relevance order.
    pub answers: Vec<Answer>,
    /// Total matches reported by the backend; may exceed `answers.len()`.
    pub total: usize,
    /// Alternative queries the backend proposed, if any.
    pub suggestions: Vec<String>,
}

/// Successful re-rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankResponse {
    pub ranked: Vec<RankedAnswer>,
}
