//! Combines a base answer sequence with an optional ranking into display order.
//!
//! Pure and deterministic. The base sequence is the corpus's relevance order
//! and is never re-sorted for the original view.
//!
//! In the ranked view answers are stable-sorted by descending ranking score.
//! Answers without a usable ranking entry sort after every ranked answer and
//! keep their original relative order, as do answers with equal scores.
//!
//! Ranking ids are normalised to [`AnswerId`] before lookup. Entries whose id
//! does not parse, or names an answer that is not in the base sequence, are
//! dropped. When an id appears more than once the first entry wins.

use serde::{Deserialize, Serialize};
use stackrank_gateway::{Answer, AnswerId, RankedAnswer};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Which ordering is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Base search order.
    #[default]
    Original,
    /// Descending re-rank score.
    Ranked,
}

/// One display row: an answer and, if known, its ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayEntry<'a> {
    pub answer: &'a Answer,
    pub ranking: Option<&'a RankedAnswer>,
}

/// Build the id → ranking lookup for `answers`.
///
/// Only ids present in `answers` are kept; duplicates keep the first entry.
pub fn ranking_lookup<'a>(
    answers: &[Answer],
    ranked: &'a [RankedAnswer],
) -> HashMap<AnswerId, &'a RankedAnswer> {
    let known: HashSet<AnswerId> = answers.iter().map(|a| a.answer_id).collect();
    let mut lookup = HashMap::with_capacity(ranked.len().min(known.len()));

    for entry in ranked {
        let Some(id) = entry.canonical_id() else {
            tracing::debug!(answer_id = %entry.answer_id, "dropping ranking with non-numeric id");
            continue;
        };
        if !known.contains(&id) {
            tracing::debug!(%id, "dropping ranking for unknown answer");
            continue;
        }
        lookup.entry(id).or_insert(entry);
    }
    lookup
}

/// Keep only the ranking entries that [`ranking_lookup`] would use, in their
/// received order.
pub fn retain_known(answers: &[Answer], ranked: Vec<RankedAnswer>) -> Vec<RankedAnswer> {
    let known: HashSet<AnswerId> = answers.iter().map(|a| a.answer_id).collect();
    let mut seen = HashSet::with_capacity(ranked.len());
    ranked
        .into_iter()
        .filter(|entry| {
            entry
                .canonical_id()
                .is_some_and(|id| known.contains(&id) && seen.insert(id))
        })
        .collect()
}

/// Merge `answers` and `ranked` into display order for `view`.
pub fn merge<'a>(
    answers: &'a [Answer],
    ranked: &'a [RankedAnswer],
    view: ViewMode,
) -> Vec<DisplayEntry<'a>> {
    let lookup = ranking_lookup(answers, ranked);
    let mut entries: Vec<DisplayEntry<'a>> = answers
        .iter()
        .map(|answer| DisplayEntry {
            answer,
            ranking: lookup.get(&answer.answer_id).copied(),
        })
        .collect();

    if view == ViewMode::Ranked && !lookup.is_empty() {
        // `sort_by` is stable: equal keys keep base order.
        entries.sort_by(|a, b| compare_ranked(sort_key(a), sort_key(b)));
    }
    entries
}

/// NaN scores count as unranked.
fn sort_key(entry: &DisplayEntry<'_>) -> Option<f64> {
    entry.ranking.map(|r| r.score).filter(|s| !s.is_nan())
}

fn compare_ranked(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
