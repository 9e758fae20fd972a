//! Download write operations: insert, progress, state, delete.

use anyhow::Result;

use super::super::db::DownloadRegistry;
use super::super::types::{DownloadId, DownloadState, NewDownload};
use crate::util::unix_millis;

impl DownloadRegistry {
    /// Insert a new in-progress download and return its id.
    pub async fn insert(&self, new: &NewDownload<'_>) -> Result<DownloadId> {
        let row_id = sqlx::query(
            r#"
            INSERT INTO downloads (
                url, final_url, filename, mime_type, state,
                paused, bytes_received, total_bytes, start_time, error
            ) VALUES (?1, NULL, ?2, ?3, ?4, 0, 0, ?5, ?6, NULL)
            "#,
        )
        .bind(new.url)
        .bind(new.filename)
        .bind(new.mime_type)
        .bind(DownloadState::InProgress.as_str())
        .bind(new.total_bytes)
        .bind(unix_millis())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(row_id)
    }

    /// Record response metadata learned once the transfer starts.
    pub async fn set_response_info(
        &self,
        id: DownloadId,
        final_url: Option<&str>,
        mime_type: Option<&str>,
        total_bytes: Option<i64>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE downloads
            SET final_url = COALESCE(?1, final_url),
                mime_type = COALESCE(?2, mime_type),
                total_bytes = COALESCE(?3, total_bytes)
            WHERE id = ?4
            "#,
        )
        .bind(final_url)
        .bind(mime_type)
        .bind(total_bytes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_bytes_received(&self, id: DownloadId, bytes: i64) -> Result<()> {
        sqlx::query("UPDATE downloads SET bytes_received = ?1 WHERE id = ?2")
            .bind(bytes)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Set the lifecycle state; `error` is stored as given (None clears it).
    pub async fn set_state(
        &self,
        id: DownloadId,
        state: DownloadState,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE downloads SET state = ?1, error = ?2 WHERE id = ?3")
            .bind(state.as_str())
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_paused(&self, id: DownloadId, paused: bool) -> Result<()> {
        sqlx::query("UPDATE downloads SET paused = ?1 WHERE id = ?2")
            .bind(paused)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove the record. Returns false if it did not exist.
    pub async fn delete(&self, id: DownloadId) -> Result<bool> {
        let res = sqlx::query("DELETE FROM downloads WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
