//! Corpus queries backing the search filters
//!
//! Each function returns the candidate set of one filter as a map from entry
//! id to that filter's score contribution. Only visible entries (approved,
//! not hidden, in a non-hidden event) are candidates. Combining candidate
//! sets is the search orchestrator's job.

use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

/// Join/where fragment selecting visible entries, aliased `n` (entries)
/// and `e` (events)
const VISIBLE_ENTRIES: &str =
    "entries n JOIN events e ON e.guid = n.event_id
     WHERE n.approved = 1 AND n.hidden = 0 AND e.hidden = 0";

fn parse_guid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Bad guid in corpus: {}", e)))
}

/// Entries whose transcript contains `query` (case-insensitive), scored by
/// occurrence count with a +2 bonus when a whole line equals the query.
pub async fn text_matches(pool: &SqlitePool, query: &str) -> Result<HashMap<Uuid, f64>> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Ok(HashMap::new());
    }

    let pattern = format!("%{}%", escape_like(&needle));

    // One row per matching line keeps occurrence counting in one pass
    let rows = sqlx::query(
        "SELECT n.guid, l.text
         FROM entry_lines l
         JOIN entries n ON n.guid = l.entry_id
         JOIN events e ON e.guid = n.event_id
         WHERE n.approved = 1 AND n.hidden = 0 AND e.hidden = 0
           AND lower(l.text) LIKE ? ESCAPE '\\'",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    let mut scores: HashMap<Uuid, f64> = HashMap::new();
    for row in &rows {
        let guid_str: String = row.get("guid");
        let text: String = row.get("text");
        let entry_id = parse_guid(&guid_str)?;

        let haystack = text.to_lowercase();
        let mut score = count_occurrences(&haystack, &needle) as f64;
        if haystack.trim() == needle {
            score += 2.0;
        }
        *scores.entry(entry_id).or_insert(0.0) += score;
    }

    Ok(scores)
}

/// Entries carrying (directly or via their event) every tag in `tags`.
/// Score = number of requested tags.
pub async fn tag_matches(pool: &SqlitePool, tags: &[String]) -> Result<HashMap<Uuid, f64>> {
    if tags.is_empty() {
        return Ok(HashMap::new());
    }

    let mut matched: Option<HashMap<Uuid, ()>> = None;

    for tag in tags {
        let sql = format!(
            "SELECT n.guid FROM {VISIBLE_ENTRIES}
               AND EXISTS (
                 SELECT 1 FROM tags t
                 LEFT JOIN entry_tags nt ON nt.tag_id = t.guid AND nt.entry_id = n.guid
                 LEFT JOIN event_tags et ON et.tag_id = t.guid AND et.event_id = e.guid
                 WHERE t.name = ?
                   AND (nt.entry_id IS NOT NULL OR et.event_id IS NOT NULL)
               )"
        );

        let rows = sqlx::query(&sql)
            .bind(tag.trim().to_lowercase())
            .fetch_all(pool)
            .await?;

        let mut with_tag = HashMap::new();
        for row in &rows {
            let guid_str: String = row.get("guid");
            with_tag.insert(parse_guid(&guid_str)?, ());
        }

        matched = Some(match matched {
            None => with_tag,
            Some(prev) => prev
                .into_iter()
                .filter(|(id, _)| with_tag.contains_key(id))
                .collect(),
        });

        // All tags are required, so an empty intersection is final
        if matched.as_ref().map(|m| m.is_empty()).unwrap_or(false) {
            break;
        }
    }

    let score = tags.len() as f64;
    Ok(matched
        .unwrap_or_default()
        .into_keys()
        .map(|id| (id, score))
        .collect())
}

/// Entries with a line spoken by someone matching `speaker`
/// (case-insensitive substring). Score = 1.
pub async fn speaker_matches(pool: &SqlitePool, speaker: &str) -> Result<HashMap<Uuid, f64>> {
    let needle = speaker.to_lowercase();
    if needle.is_empty() {
        return Ok(HashMap::new());
    }

    let pattern = format!("%{}%", escape_like(&needle));
    let sql = format!(
        "SELECT n.guid FROM {VISIBLE_ENTRIES}
           AND EXISTS (SELECT 1 FROM entry_lines l
                       WHERE l.entry_id = n.guid
                         AND lower(l.speaker) LIKE ? ESCAPE '\\')"
    );

    let rows = sqlx::query(&sql).bind(&pattern).fetch_all(pool).await?;

    let mut scores = HashMap::new();
    for row in &rows {
        let guid_str: String = row.get("guid");
        scores.insert(parse_guid(&guid_str)?, 1.0);
    }

    Ok(scores)
}

/// Entries whose event date falls in the inclusive range. Pure predicate,
/// score = 0.
pub async fn date_matches(
    pool: &SqlitePool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<HashMap<Uuid, f64>> {
    if from.is_none() && to.is_none() {
        return Ok(HashMap::new());
    }

    let lower = from.map(|d| d.to_string()).unwrap_or_else(|| "0000-00-00".to_string());
    let upper = to.map(|d| d.to_string()).unwrap_or_else(|| "9999-99-99".to_string());

    let sql = format!("SELECT n.guid FROM {VISIBLE_ENTRIES} AND e.date >= ? AND e.date <= ?");

    let rows = sqlx::query(&sql)
        .bind(&lower)
        .bind(&upper)
        .fetch_all(pool)
        .await?;

    let mut scores = HashMap::new();
    for row in &rows {
        let guid_str: String = row.get("guid");
        scores.insert(parse_guid(&guid_str)?, 0.0);
    }

    Ok(scores)
}

/// (event date, display order) for a set of entries, used by date ordering
pub async fn entry_sort_keys(
    pool: &SqlitePool,
    entry_ids: &[Uuid],
) -> Result<HashMap<Uuid, (String, i64)>> {
    let mut keys = HashMap::with_capacity(entry_ids.len());

    for &entry_id in entry_ids {
        let row = sqlx::query(
            "SELECT e.date, n.display_order
             FROM entries n JOIN events e ON e.guid = n.event_id
             WHERE n.guid = ?",
        )
        .bind(entry_id.to_string())
        .fetch_optional(pool)
        .await?;

        if let Some(row) = row {
            let date: String = row.get("date");
            let display_order: i64 = row.get("display_order");
            keys.insert(entry_id, (date, display_order));
        }
    }

    Ok(keys)
}

/// Count non-overlapping occurrences of `needle` in `haystack`
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut pos = 0;
    while let Some(found) = haystack[pos..].find(needle) {
        count += 1;
        pos += found + needle.len();
    }
    count
}

/// Escape LIKE wildcards in user input
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_counting() {
        assert_eq!(count_occurrences("spren and spren", "spren"), 2);
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
        assert_eq!(count_occurrences("nothing here", "spren"), 0);
        assert_eq!(count_occurrences("anything", ""), 0);
    }
}
