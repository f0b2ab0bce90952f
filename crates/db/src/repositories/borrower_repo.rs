//! Repository for the `borrowers` table.

use bibliotech_core::library::BorrowerStanding;
use bibliotech_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::library::{BorrowerRow, CreateBorrower};

/// Column list for `borrowers` queries.
const COLUMNS: &str = "id, name, email, phone, standing, created_at, updated_at";

pub struct BorrowerRepo;

impl BorrowerRepo {
    /// Insert a borrower in regular standing.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateBorrower,
    ) -> Result<BorrowerRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO borrowers (name, email, phone) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BorrowerRow>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<BorrowerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM borrowers WHERE id = $1");
        sqlx::query_as::<_, BorrowerRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Returns `true` if the borrower exists and was updated.
    pub async fn set_standing<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        standing: BorrowerStanding,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE borrowers SET standing = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(standing.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
