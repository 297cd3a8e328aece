//! Search orchestrator
//!
//! Builds a filter set from request parameters, evaluates it against the
//! entry corpus, ranks the matches, and paginates the result. The
//! combination rule is part of the page contract:
//!
//! - filters combine **conjunctively**: an entry is returned iff it matches
//!   every active filter;
//! - an entry's score is the **sum** of the per-filter scores, so more text
//!   occurrences and more matched tags rank higher;
//! - `rank` ordering sorts by descending score with ascending entry id as
//!   the tie-break, which makes result order deterministic for a fixed
//!   corpus.
//!
//! Everything here is a pure function over query data; no state is carried
//! between requests.

mod filters;

pub use filters::{encode_param, SearchFilter};

use crate::pagination::{self, Pagination};
use lorehall_common::db::search as corpus;
use lorehall_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

/// Result ordering selected by the `ordering` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// Descending relevance score (default)
    Rank,
    /// Descending event date, then entry display order
    Date,
}

impl Ordering {
    /// Unknown values fall back to rank
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("date") => Ordering::Date,
            _ => Ordering::Rank,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Ordering::Rank => "rank",
            Ordering::Date => "date",
        }
    }
}

/// Parse recognized query parameters into the filter set.
///
/// Always returns the same four filters in the same order; unrecognized or
/// empty parameters simply leave their filter inactive. Same parameters in,
/// same filter set out.
pub fn init_filters(params: &HashMap<String, String>) -> Vec<SearchFilter> {
    let get = |key: &str| params.get(key).map(String::as_str);

    vec![
        SearchFilter::text(get("query")),
        SearchFilter::tags(get("tags")),
        SearchFilter::speaker(get("speaker")),
        SearchFilter::date_range(get("date_from"), get("date_to")),
    ]
}

/// Serialized search parameters (ordering plus every active filter),
/// used to rebuild pagination links on the results page
pub fn serialize_search_params(ordering: Ordering, filters: &[SearchFilter]) -> String {
    let mut params = vec![format!("ordering={}", ordering.as_param())];
    params.extend(filters.iter().filter_map(SearchFilter::as_url_param));
    params.join("&")
}

/// Evaluate the filter set: entry id -> combined score.
///
/// Fails closed: with no active filter the result is empty. Otherwise the
/// candidate sets are intersected and scores summed per entry.
pub async fn execute_filters(
    pool: &SqlitePool,
    filters: &[SearchFilter],
) -> Result<HashMap<Uuid, f64>> {
    let active: Vec<&SearchFilter> = filters.iter().filter(|f| f.is_active()).collect();
    if active.is_empty() {
        return Ok(HashMap::new());
    }

    let mut combined: Option<HashMap<Uuid, f64>> = None;

    for filter in active {
        let matches = filter.evaluate(pool).await?;

        combined = Some(match combined {
            None => matches,
            Some(prev) => prev
                .into_iter()
                .filter_map(|(id, score)| matches.get(&id).map(|s| (id, score + s)))
                .collect(),
        });

        // Conjunctive: an empty intersection cannot recover
        if combined.as_ref().map(|c| c.is_empty()).unwrap_or(false) {
            break;
        }
    }

    Ok(combined.unwrap_or_default())
}

/// Order scored entries into the final result sequence
pub async fn get_search_results(
    pool: &SqlitePool,
    scores: HashMap<Uuid, f64>,
    ordering: Ordering,
) -> Result<Vec<Uuid>> {
    match ordering {
        Ordering::Rank => Ok(rank_order(scores)),
        Ordering::Date => {
            let ids: Vec<Uuid> = scores.keys().copied().collect();
            let keys = corpus::entry_sort_keys(pool, &ids).await?;
            Ok(date_order(scores, &keys))
        }
    }
}

/// Descending score, ascending entry id as the tie-break
fn rank_order(scores: HashMap<Uuid, f64>) -> Vec<Uuid> {
    let mut scored: Vec<(Uuid, f64)> = scores.into_iter().collect();
    scored.sort_by(|(a_id, a_score), (b_id, b_score)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a_id.cmp(b_id))
    });
    scored.into_iter().map(|(id, _)| id).collect()
}

/// Descending event date, ascending display order, ascending entry id
fn date_order(scores: HashMap<Uuid, f64>, keys: &HashMap<Uuid, (String, i64)>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = scores.into_keys().collect();
    ids.sort_by(|a, b| {
        let a_key = keys.get(a);
        let b_key = keys.get(b);
        match (a_key, b_key) {
            (Some((a_date, a_ord)), Some((b_date, b_ord))) => b_date
                .cmp(a_date)
                .then(a_ord.cmp(b_ord))
                .then(a.cmp(b)),
            // Entries that lost their event since evaluation sort last
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    ids
}

/// Clamp the requested page and slice the ordered results
pub fn paginate_search_results(
    results: &[Uuid],
    page_param: Option<&str>,
    page_length: i64,
) -> (Vec<Uuid>, Pagination) {
    let requested = pagination::parse_page_param(page_param);
    let p = pagination::calculate_pagination(results.len() as i64, requested, page_length);
    (pagination::page_slice(results, &p).to_vec(), p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    #[test]
    fn ordering_param_falls_back_to_rank() {
        assert_eq!(Ordering::from_param(Some("date")), Ordering::Date);
        assert_eq!(Ordering::from_param(Some("bogus")), Ordering::Rank);
        assert_eq!(Ordering::from_param(None), Ordering::Rank);
    }

    #[test]
    fn init_filters_is_stable() {
        let mut params = HashMap::new();
        params.insert("query".to_string(), "storms".to_string());
        params.insert("ignored".to_string(), "value".to_string());

        let a = init_filters(&params);
        let b = init_filters(&params);
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_eq!(a.iter().filter(|f| f.is_active()).count(), 1);
    }

    #[test]
    fn serialized_params_include_ordering_and_active_filters_only() {
        let mut params = HashMap::new();
        params.insert("query".to_string(), "storms".to_string());
        params.insert("speaker".to_string(), String::new());

        let filters = init_filters(&params);
        let serialized = serialize_search_params(Ordering::Rank, &filters);
        assert_eq!(serialized, "ordering=rank&query=storms");
    }

    #[test]
    fn rank_order_descending_with_id_tie_break() {
        let mut scores = HashMap::new();
        scores.insert(uuid(3), 1.0);
        scores.insert(uuid(1), 5.0);
        scores.insert(uuid(2), 5.0);

        let ordered = rank_order(scores);
        assert_eq!(ordered, vec![uuid(1), uuid(2), uuid(3)]);
    }

    #[test]
    fn date_order_newest_first_then_display_order() {
        let mut scores = HashMap::new();
        scores.insert(uuid(1), 1.0);
        scores.insert(uuid(2), 9.0);
        scores.insert(uuid(3), 4.0);

        let mut keys = HashMap::new();
        keys.insert(uuid(1), ("2019-05-01".to_string(), 2));
        keys.insert(uuid(2), ("2019-05-01".to_string(), 1));
        keys.insert(uuid(3), ("2021-01-15".to_string(), 7));

        let ordered = date_order(scores, &keys);
        assert_eq!(ordered, vec![uuid(3), uuid(2), uuid(1)]);
    }

    #[test]
    fn pagination_clamps_and_partitions() {
        let results: Vec<Uuid> = (0..25).map(uuid).collect();

        let (page, p) = paginate_search_results(&results, Some("2"), 10);
        assert_eq!(p.page, 2);
        assert_eq!(page, results[10..20].to_vec());

        // Non-numeric page falls back to the first page
        let (page, p) = paginate_search_results(&results, Some("x"), 10);
        assert_eq!(p.page, 1);
        assert_eq!(page, results[..10].to_vec());

        // Beyond the last page clamps to the last page
        let (page, p) = paginate_search_results(&results, Some("99"), 10);
        assert_eq!(p.page, 3);
        assert_eq!(page, results[20..].to_vec());

        // Concatenating every page reproduces the sequence exactly once
        let mut walked = Vec::new();
        for n in 1..=p.total_pages {
            let param = n.to_string();
            let (page, _) = paginate_search_results(&results, Some(param.as_str()), 10);
            walked.extend(page);
        }
        assert_eq!(walked, results);
    }
}
