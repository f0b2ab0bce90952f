//! Repository for the `staff_users` table.

use bibliotech_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::library::StaffUserRow;

const COLUMNS: &str = "id, name, created_at";

pub struct UserRepo;

impl UserRepo {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<StaffUserRow, sqlx::Error> {
        let query = format!("INSERT INTO staff_users (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, StaffUserRow>(&query)
            .bind(name)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<StaffUserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM staff_users WHERE id = $1");
        sqlx::query_as::<_, StaffUserRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
