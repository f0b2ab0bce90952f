//! Repository for the `book_copies` table.

use bibliotech_core::library::CopyStatus;
use bibliotech_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::library::CopyRow;

/// Column list for `book_copies` queries.
const COLUMNS: &str = "id, title, status, created_at, updated_at";

pub struct CopyRepo;

impl CopyRepo {
    /// Insert an available copy.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        title: &str,
    ) -> Result<CopyRow, sqlx::Error> {
        let query = format!("INSERT INTO book_copies (title) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, CopyRow>(&query)
            .bind(title)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<CopyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM book_copies WHERE id = $1");
        sqlx::query_as::<_, CopyRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Returns `true` if the copy exists and was updated.
    pub async fn set_status<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        status: CopyStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
