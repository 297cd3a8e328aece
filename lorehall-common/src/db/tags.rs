//! Tag queries: autocomplete suggestions and usage grouping

use crate::db::models::TagUsage;
use crate::Result;
use sqlx::{Row, SqlitePool};

/// Tags matching an autocomplete query, with combined usage counts.
///
/// A tag matches when its name starts with the query, or contains the query
/// preceded by a space (word boundary). Results are sorted by descending
/// combined entry+event usage. An empty query matches every tag.
pub async fn suggest(pool: &SqlitePool, query: &str) -> Result<Vec<TagUsage>> {
    let prefix = format!("{}%", escape_like(query));
    let word = format!("% {}%", escape_like(query));

    let rows = sqlx::query(
        "SELECT t.name,
                (SELECT COUNT(*) FROM entry_tags nt WHERE nt.tag_id = t.guid) AS entry_count,
                (SELECT COUNT(*) FROM event_tags et WHERE et.tag_id = t.guid) AS event_count
         FROM tags t
         WHERE t.name LIKE ? ESCAPE '\\' OR t.name LIKE ? ESCAPE '\\'",
    )
    .bind(&prefix)
    .bind(&word)
    .fetch_all(pool)
    .await?;

    let mut usages: Vec<TagUsage> = rows
        .iter()
        .map(|row| TagUsage {
            name: row.get("name"),
            entry_count: row.get("entry_count"),
            event_count: row.get("event_count"),
        })
        .collect();

    // Descending combined usage, name as the deterministic tie-break
    usages.sort_by(|a, b| b.total().cmp(&a.total()).then(a.name.cmp(&b.name)));

    Ok(usages)
}

/// Tags that are used on at least one entry, with their entry usage counts,
/// sorted descending (tags index page)
pub async fn entry_usage(pool: &SqlitePool) -> Result<Vec<TagUsage>> {
    usage_by_join(pool, "entry_tags", "entry_id").await
}

/// Tags that are used on at least one event, with their event usage counts,
/// sorted descending
pub async fn event_usage(pool: &SqlitePool) -> Result<Vec<TagUsage>> {
    usage_by_join(pool, "event_tags", "event_id").await
}

async fn usage_by_join(pool: &SqlitePool, join_table: &str, fk: &str) -> Result<Vec<TagUsage>> {
    // join_table/fk come from the two call sites above, never from input
    let sql = format!(
        "SELECT t.name, COUNT(j.{fk}) AS used
         FROM tags t
         JOIN {join_table} j ON j.tag_id = t.guid
         GROUP BY t.guid
         HAVING used > 0
         ORDER BY used DESC, t.name ASC",
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let used: i64 = row.get("used");
            let (entry_count, event_count) = if join_table == "entry_tags" {
                (used, 0)
            } else {
                (0, used)
            };
            TagUsage {
                name: row.get("name"),
                entry_count,
                event_count,
            }
        })
        .collect())
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
    fn like_escaping() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
