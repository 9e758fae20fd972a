//! Download read operations: get and search.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::super::db::DownloadRegistry;
use super::super::types::{DownloadId, DownloadItem, DownloadQuery, DownloadState};

const COLUMNS: &str = "id, url, final_url, filename, mime_type, state, paused, \
                       bytes_received, total_bytes, start_time, error";

fn item_from_row(row: &SqliteRow) -> DownloadItem {
    let state: String = row.get("state");
    DownloadItem {
        id: row.get("id"),
        url: row.get("url"),
        final_url: row.get("final_url"),
        filename: row.get("filename"),
        mime_type: row.get("mime_type"),
        state: DownloadState::from_str(&state),
        paused: row.get("paused"),
        bytes_received: row.get("bytes_received"),
        total_bytes: row.get("total_bytes"),
        start_time: row.get("start_time"),
        error: row.get("error"),
    }
}

impl DownloadRegistry {
    pub async fn get(&self, id: DownloadId) -> Result<Option<DownloadItem>> {
        let row = sqlx::query(&format!("SELECT {} FROM downloads WHERE id = ?1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(item_from_row))
    }

    /// Items matching `query`, newest first.
    pub async fn search(&self, query: &DownloadQuery) -> Result<Vec<DownloadItem>> {
        let pattern = query.url_contains.as_ref().map(|s| format!("%{}%", s));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM downloads
            WHERE (?1 IS NULL OR id = ?1)
              AND (?2 IS NULL OR state = ?2)
              AND (?3 IS NULL OR url LIKE ?3 OR final_url LIKE ?3)
            ORDER BY start_time DESC, id DESC
            LIMIT ?4
            "#,
            COLUMNS
        ))
        .bind(query.id)
        .bind(query.state.map(DownloadState::as_str))
        .bind(pattern)
        .bind(query.limit.map(i64::from).unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(item_from_row).collect())
    }
}
