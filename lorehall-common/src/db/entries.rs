//! Entry and entry-line queries

use crate::db::models::{Entry, EntryDetail, EntryLine};
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Entry> {
    let guid_str: String = row.get("guid");
    let event_str: String = row.get("event_id");
    let approved: i64 = row.get("approved");
    let hidden: i64 = row.get("hidden");

    Ok(Entry {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| Error::Internal(format!("Bad entry guid: {}", e)))?,
        event_id: Uuid::parse_str(&event_str)
            .map_err(|e| Error::Internal(format!("Bad entry event id: {}", e)))?,
        display_order: row.get("display_order"),
        approved: approved != 0,
        hidden: hidden != 0,
    })
}

/// Count visible entries across the archive
pub async fn count_visible(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM entries n
         JOIN events e ON e.guid = n.event_id
         WHERE n.approved = 1 AND n.hidden = 0 AND e.hidden = 0",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Load a single entry by id, regardless of visibility
pub async fn load_entry(pool: &SqlitePool, entry_id: Uuid) -> Result<Option<Entry>> {
    let row = sqlx::query(
        "SELECT guid, event_id, display_order, approved, hidden
         FROM entries WHERE guid = ?",
    )
    .bind(entry_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(entry_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Visible entries of an event, ordered by display order, with transcript
/// lines and tag names attached
pub async fn event_entries(pool: &SqlitePool, event_id: Uuid) -> Result<Vec<EntryDetail>> {
    let rows = sqlx::query(
        "SELECT guid, event_id, display_order, approved, hidden
         FROM entries
         WHERE event_id = ? AND approved = 1 AND hidden = 0
         ORDER BY display_order ASC, guid ASC",
    )
    .bind(event_id.to_string())
    .fetch_all(pool)
    .await?;

    let entries: Vec<Entry> = rows
        .iter()
        .map(entry_from_row)
        .collect::<Result<Vec<_>>>()?;

    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut lines_by_entry = load_lines(pool, entries.iter().map(|e| e.guid)).await?;
    let mut tags_by_entry = load_entry_tags(pool, entries.iter().map(|e| e.guid)).await?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            let lines = lines_by_entry.remove(&entry.guid).unwrap_or_default();
            let tags = tags_by_entry.remove(&entry.guid).unwrap_or_default();
            EntryDetail { entry, lines, tags }
        })
        .collect())
}

/// Transcript lines for a set of entries, keyed by entry id
pub async fn load_lines(
    pool: &SqlitePool,
    entry_ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, Vec<EntryLine>>> {
    let mut map: HashMap<Uuid, Vec<EntryLine>> = HashMap::new();

    for entry_id in entry_ids {
        let rows = sqlx::query(
            "SELECT guid, entry_id, line_order, speaker, text
             FROM entry_lines
             WHERE entry_id = ?
             ORDER BY line_order ASC",
        )
        .bind(entry_id.to_string())
        .fetch_all(pool)
        .await?;

        let lines = rows
            .iter()
            .map(|row| {
                let guid_str: String = row.get("guid");
                Ok(EntryLine {
                    guid: Uuid::parse_str(&guid_str)
                        .map_err(|e| Error::Internal(format!("Bad line guid: {}", e)))?,
                    entry_id,
                    line_order: row.get("line_order"),
                    speaker: row.get("speaker"),
                    text: row.get("text"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        map.insert(entry_id, lines);
    }

    Ok(map)
}

async fn load_entry_tags(
    pool: &SqlitePool,
    entry_ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, Vec<String>>> {
    let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();

    for entry_id in entry_ids {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT t.name FROM tags t
             JOIN entry_tags nt ON nt.tag_id = t.guid
             WHERE nt.entry_id = ?
             ORDER BY t.name",
        )
        .bind(entry_id.to_string())
        .fetch_all(pool)
        .await?;

        map.insert(entry_id, rows.into_iter().map(|(name,)| name).collect());
    }

    Ok(map)
}

/// Load full details for an ordered list of entry ids (search results page)
///
/// Preserves the order of `entry_ids`; ids that vanished since evaluation
/// are skipped.
pub async fn load_details_ordered(
    pool: &SqlitePool,
    entry_ids: &[Uuid],
) -> Result<Vec<EntryDetail>> {
    let mut details = Vec::with_capacity(entry_ids.len());

    for &entry_id in entry_ids {
        let Some(entry) = load_entry(pool, entry_id).await? else {
            continue;
        };
        let mut lines_map = load_lines(pool, std::iter::once(entry_id)).await?;
        let mut tags_map = load_entry_tags(pool, std::iter::once(entry_id)).await?;
        details.push(EntryDetail {
            entry,
            lines: lines_map.remove(&entry_id).unwrap_or_default(),
            tags: tags_map.remove(&entry_id).unwrap_or_default(),
        });
    }

    Ok(details)
}
