//! Plain-text helpers for snapshot rows and recent searches.
//!
//! These do not sanitize markup: the raw answer body is always carried
//! alongside. They only derive a short readable excerpt and date labels so
//! a thin presentation shell does not need an HTML parser or a date library.

use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::Html;

/// Elements whose text never belongs in an excerpt.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Extract readable text from an HTML fragment, collapsing whitespace.
pub fn plain_text(body: &str) -> String {
    let fragment = Html::parse_fragment(body);
    let mut raw = String::with_capacity(body.len());

    for node in fragment.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`plain_text`] cut to at most `max_chars` characters, with `...` appended
/// when anything was cut.
pub fn excerpt(body: &str, max_chars: usize) -> String {
    let text = plain_text(body);
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// `YYYY-MM-DD` (UTC) for an epoch-seconds timestamp, or `None` if out of range.
pub fn format_creation_date(epoch_secs: i64) -> Option<String> {
    DateTime::from_timestamp(epoch_secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Timestamp layouts accepted from the backend when no offset is given.
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Short age label for a backend timestamp relative to `now`.
///
/// Under an hour (or in the future) is `Just now`, under a day is `{h}h ago`,
/// under two days is `Yesterday`, anything older is the `YYYY-MM-DD` date.
/// Timestamps without an offset are read as UTC. Returns `None` if
/// `timestamp` cannot be parsed.
pub fn relative_age(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let at = parse_timestamp(timestamp.trim())?;
    let hours = (now - at).num_hours();
    let label = match hours {
        ..1 => "Just now".to_owned(),
        1..24 => format!("{hours}h ago"),
        24..48 => "Yesterday".to_owned(),
        _ => at.format("%Y-%m-%d").to_string(),
    };
    Some(label)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|naive| naive.and_utc())
}

/// Link to an answer given a configured prefix.
pub fn permalink(link_base: &str, answer_id: impl std::fmt::Display) -> String {
    format!("{link_base}{answer_id}")
}
