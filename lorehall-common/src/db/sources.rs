//! Audio and image source queries

use crate::db::models::{RelatedSite, Source, SourceKind};
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

fn source_from_row(row: &sqlx::sqlite::SqliteRow, kind: SourceKind) -> Result<Source> {
    let guid_str: String = row.get("guid");
    let event_str: String = row.get("event_id");

    Ok(Source {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| Error::Internal(format!("Bad source guid: {}", e)))?,
        event_id: Uuid::parse_str(&event_str)
            .map_err(|e| Error::Internal(format!("Bad source event id: {}", e)))?,
        title: row.get("title"),
        url: row.get("url"),
        kind,
        created_at: row.get("created_at"),
    })
}

fn table_for(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Audio => "audio_sources",
        SourceKind::Image => "image_sources",
    }
}

/// Count visible audio sources (home page statistic)
pub async fn count_visible_audio(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audio_sources s
         JOIN events e ON e.guid = s.event_id
         WHERE s.approved = 1 AND s.hidden = 0 AND e.hidden = 0",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Newest visible sources of one kind
async fn newest_of_kind(pool: &SqlitePool, kind: SourceKind, limit: i64) -> Result<Vec<Source>> {
    let sql = format!(
        "SELECT s.guid, s.event_id, s.title, s.url, s.created_at
         FROM {} s
         JOIN events e ON e.guid = s.event_id
         WHERE s.approved = 1 AND s.hidden = 0 AND e.hidden = 0
         ORDER BY s.created_at DESC
         LIMIT ?",
        table_for(kind)
    );

    let rows = sqlx::query(&sql).bind(limit).fetch_all(pool).await?;
    rows.iter().map(|row| source_from_row(row, kind)).collect()
}

/// Newest visible sources across both kinds, merged by creation date
/// (newest first) and truncated to `limit`
pub async fn newest(pool: &SqlitePool, limit: i64) -> Result<Vec<Source>> {
    let mut sources = newest_of_kind(pool, SourceKind::Audio, limit).await?;
    sources.extend(newest_of_kind(pool, SourceKind::Image, limit).await?);

    sources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sources.truncate(limit as usize);

    Ok(sources)
}

/// Visible sources attached to one event, audio first
pub async fn event_sources(pool: &SqlitePool, event_id: Uuid) -> Result<Vec<Source>> {
    let mut sources = Vec::new();

    for kind in [SourceKind::Audio, SourceKind::Image] {
        let sql = format!(
            "SELECT guid, event_id, title, url, created_at
             FROM {}
             WHERE event_id = ? AND approved = 1 AND hidden = 0
             ORDER BY created_at ASC",
            table_for(kind)
        );

        let rows = sqlx::query(&sql)
            .bind(event_id.to_string())
            .fetch_all(pool)
            .await?;

        for row in &rows {
            sources.push(source_from_row(row, kind)?);
        }
    }

    Ok(sources)
}

/// All related sites for the home page footer
pub async fn related_sites(pool: &SqlitePool) -> Result<Vec<RelatedSite>> {
    let rows = sqlx::query("SELECT name, url, image_url FROM related_sites ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| RelatedSite {
            name: row.get("name"),
            url: row.get("url"),
            image_url: row.get("image_url"),
        })
        .collect())
}
