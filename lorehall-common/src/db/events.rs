//! Event queries
//!
//! Everything here applies the visibility rule: hidden events never surface.

use crate::db::models::Event;
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Column the events listing can sort by
///
/// Whitelisted to the two real columns so request parameters never reach
/// the SQL text directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSort {
    Name,
    Date,
}

impl EventSort {
    /// Parse a request parameter, falling back to the date column
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("name") => EventSort::Name,
            _ => EventSort::Date,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            EventSort::Name => "name",
            EventSort::Date => "date",
        }
    }
}

/// Sort direction, newest/descending by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

fn event_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Event> {
    let guid_str: String = row.get("guid");
    let date_str: String = row.get("date");
    let hidden: i64 = row.get("hidden");

    Ok(Event {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| Error::Internal(format!("Bad event guid: {}", e)))?,
        name: row.get("name"),
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| Error::Internal(format!("Bad event date '{}': {}", date_str, e)))?,
        location: row.get("location"),
        review_state: row.get("review_state"),
        hidden: hidden != 0,
    })
}

/// Count visible events
pub async fn count_visible(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE hidden = 0")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of visible events, ordered by the requested column with a
/// secondary sort by name for stability
pub async fn list_visible(
    pool: &SqlitePool,
    sort: EventSort,
    order: SortOrder,
    limit: i64,
    offset: i64,
) -> Result<Vec<Event>> {
    let sql = format!(
        "SELECT guid, name, date, location, review_state, hidden
         FROM events
         WHERE hidden = 0
         ORDER BY {} {}, name ASC
         LIMIT ? OFFSET ?",
        sort.column(),
        order.keyword()
    );

    let rows = sqlx::query(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.iter().map(event_from_row).collect()
}

/// Newest visible events that have at least one visible entry, with the
/// visible entry count for each (home page listing)
pub async fn newest_with_entries(pool: &SqlitePool, limit: i64) -> Result<Vec<(Event, i64)>> {
    let rows = sqlx::query(
        "SELECT e.guid, e.name, e.date, e.location, e.review_state, e.hidden,
                COUNT(n.guid) AS entry_count
         FROM events e
         JOIN entries n ON n.event_id = e.guid AND n.approved = 1 AND n.hidden = 0
         WHERE e.hidden = 0
         GROUP BY e.guid
         ORDER BY e.date DESC, e.name ASC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let event = event_from_row(row)?;
            let entry_count: i64 = row.get("entry_count");
            Ok((event, entry_count))
        })
        .collect()
}

/// Load a single event by id, regardless of visibility
///
/// Callers decide how to treat hidden events (the public pages 404).
pub async fn load_event(pool: &SqlitePool, event_id: Uuid) -> Result<Option<Event>> {
    let row = sqlx::query(
        "SELECT guid, name, date, location, review_state, hidden
         FROM events WHERE guid = ?",
    )
    .bind(event_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(event_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Tag names attached to an event
pub async fn event_tags(pool: &SqlitePool, event_id: Uuid) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT t.name FROM tags t
         JOIN event_tags et ON et.tag_id = t.guid
         WHERE et.event_id = ?
         ORDER BY t.name",
    )
    .bind(event_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_params_fall_back_to_defaults() {
        assert_eq!(EventSort::from_param(Some("name")), EventSort::Name);
        assert_eq!(EventSort::from_param(Some("bogus")), EventSort::Date);
        assert_eq!(EventSort::from_param(None), EventSort::Date);
        assert_eq!(SortOrder::from_param(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(Some("junk")), SortOrder::Desc);
    }
}
