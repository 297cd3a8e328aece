//! Search filters
//!
//! Each filter is a named predicate parsed from one or two query
//! parameters. A filter parsed from empty or missing parameters is
//! *inactive*: it contributes no predicate and serializes to nothing, so
//! the filter set is always the same shape for a given request and the
//! pagination links can be rebuilt from `as_url_param` output alone.

use chrono::NaiveDate;
use lorehall_common::db::search as corpus;
use lorehall_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

/// A search filter with its parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFilter {
    /// Free-text match against entry transcript lines.
    /// Scores by occurrence count, +2 when a whole line equals the query.
    Text { query: String },

    /// Entry (or its event) must carry every listed tag.
    /// Scores the number of requested tags.
    Tags { tags: Vec<String> },

    /// A transcript line's speaker must contain the fragment. Scores 1.
    Speaker { name: String },

    /// Event date must fall in the inclusive range. Pure predicate, scores 0.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl SearchFilter {
    pub fn text(raw: Option<&str>) -> Self {
        SearchFilter::Text {
            query: raw.unwrap_or("").trim().to_string(),
        }
    }

    pub fn tags(raw: Option<&str>) -> Self {
        let tags = raw
            .unwrap_or("")
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        SearchFilter::Tags { tags }
    }

    pub fn speaker(raw: Option<&str>) -> Self {
        SearchFilter::Speaker {
            name: raw.unwrap_or("").trim().to_string(),
        }
    }

    /// Unparseable dates leave the bound unset
    pub fn date_range(raw_from: Option<&str>, raw_to: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        };
        SearchFilter::DateRange {
            from: parse(raw_from),
            to: parse(raw_to),
        }
    }

    /// Whether this filter contributes a predicate
    pub fn is_active(&self) -> bool {
        match self {
            SearchFilter::Text { query } => !query.is_empty(),
            SearchFilter::Tags { tags } => !tags.is_empty(),
            SearchFilter::Speaker { name } => !name.is_empty(),
            SearchFilter::DateRange { from, to } => from.is_some() || to.is_some(),
        }
    }

    /// Stable URL serialization used to rebuild pagination links;
    /// None when inactive
    pub fn as_url_param(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }

        Some(match self {
            SearchFilter::Text { query } => format!("query={}", encode_param(query)),
            SearchFilter::Tags { tags } => format!("tags={}", encode_param(&tags.join(","))),
            SearchFilter::Speaker { name } => format!("speaker={}", encode_param(name)),
            SearchFilter::DateRange { from, to } => {
                let mut parts = Vec::new();
                if let Some(from) = from {
                    parts.push(format!("date_from={}", from));
                }
                if let Some(to) = to {
                    parts.push(format!("date_to={}", to));
                }
                parts.join("&")
            }
        })
    }

    /// Human-readable description for the results page; None when inactive
    pub fn describe(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }

        Some(match self {
            SearchFilter::Text { query } => format!("text contains \"{}\"", query),
            SearchFilter::Tags { tags } => format!("tagged {}", tags.join(", ")),
            SearchFilter::Speaker { name } => format!("spoken by \"{}\"", name),
            SearchFilter::DateRange { from, to } => match (from, to) {
                (Some(from), Some(to)) => format!("between {} and {}", from, to),
                (Some(from), None) => format!("on or after {}", from),
                (None, Some(to)) => format!("on or before {}", to),
                (None, None) => unreachable!("inactive range filtered above"),
            },
        })
    }

    /// Evaluate this filter against the corpus: entry id -> score
    /// contribution. Inactive filters return the empty map.
    pub async fn evaluate(&self, pool: &SqlitePool) -> Result<HashMap<Uuid, f64>> {
        if !self.is_active() {
            return Ok(HashMap::new());
        }

        match self {
            SearchFilter::Text { query } => corpus::text_matches(pool, query).await,
            SearchFilter::Tags { tags } => corpus::tag_matches(pool, tags).await,
            SearchFilter::Speaker { name } => corpus::speaker_matches(pool, name).await,
            SearchFilter::DateRange { from, to } => {
                corpus::date_matches(pool, *from, *to).await
            }
        }
    }
}

/// Percent-encode a query-string value (space as %20)
pub fn encode_param(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_are_inactive_and_serialize_to_nothing() {
        assert!(!SearchFilter::text(None).is_active());
        assert!(!SearchFilter::text(Some("   ")).is_active());
        assert!(!SearchFilter::tags(Some(" , ,")).is_active());
        assert!(!SearchFilter::speaker(Some("")).is_active());
        assert!(!SearchFilter::date_range(None, Some("not-a-date")).is_active());

        assert_eq!(SearchFilter::text(None).as_url_param(), None);
        assert_eq!(SearchFilter::tags(None).as_url_param(), None);
        assert_eq!(SearchFilter::date_range(None, None).as_url_param(), None);
    }

    #[test]
    fn parsing_is_idempotent() {
        let a = SearchFilter::tags(Some("Magic, HISTORY ,magic "));
        let b = SearchFilter::tags(Some("Magic, HISTORY ,magic "));
        assert_eq!(a, b);
    }

    #[test]
    fn url_params_round_trip_shape() {
        let f = SearchFilter::text(Some("shattered plains"));
        assert_eq!(f.as_url_param().unwrap(), "query=shattered%20plains");

        let f = SearchFilter::tags(Some("magic,history"));
        assert_eq!(f.as_url_param().unwrap(), "tags=magic%2Chistory");

        let f = SearchFilter::date_range(Some("2019-01-01"), Some("2019-12-31"));
        assert_eq!(
            f.as_url_param().unwrap(),
            "date_from=2019-01-01&date_to=2019-12-31"
        );

        let f = SearchFilter::date_range(None, Some("2019-12-31"));
        assert_eq!(f.as_url_param().unwrap(), "date_to=2019-12-31");
    }

    #[test]
    fn describe_matches_activity() {
        assert!(SearchFilter::speaker(Some("Brandon")).describe().is_some());
        assert!(SearchFilter::speaker(None).describe().is_none());
    }

    #[test]
    fn encode_param_escapes_reserved() {
        assert_eq!(encode_param("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_param("plain-text_1.0~"), "plain-text_1.0~");
    }
}
