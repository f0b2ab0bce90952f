//! Repository for the `loans` table.

use bibliotech_core::loan::{Loan, LoanStatus, NewLoan};
use bibliotech_core::types::DbId;
use chrono::NaiveDate;
use sqlx::PgExecutor;

use crate::models::loan::LoanRow;

/// Column list for `loans` queries.
const COLUMNS: &str = "id, borrower_id, copy_id, created_by, completed_by, status, \
                       loan_date, due_date, completion_date, renewal_count, observation, \
                       last_notified_date, created_at, updated_at";

pub struct LoanRepo;

impl LoanRepo {
    /// Insert a pending loan.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &NewLoan,
    ) -> Result<LoanRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO loans (borrower_id, copy_id, created_by, status, loan_date, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanRow>(&query)
            .bind(input.borrower_id)
            .bind(input.copy_id)
            .bind(input.created_by)
            .bind(LoanStatus::Pending.as_str())
            .bind(input.loan_date)
            .bind(input.due_date)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<LoanRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loans WHERE id = $1");
        sqlx::query_as::<_, LoanRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Write every mutable column of `loan`.
    ///
    /// Returns `None` if no row has the loan's id.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        loan: &Loan,
    ) -> Result<Option<LoanRow>, sqlx::Error> {
        let query = format!(
            "UPDATE loans SET \
                completed_by = $2, \
                status = $3, \
                due_date = $4, \
                completion_date = $5, \
                renewal_count = $6, \
                observation = $7, \
                last_notified_date = $8, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanRow>(&query)
            .bind(loan.id)
            .bind(loan.completed_by)
            .bind(loan.status.as_str())
            .bind(loan.due_date)
            .bind(loan.completion_date)
            .bind(loan.renewal_count)
            .bind(&loan.observation)
            .bind(loan.last_notified_date)
            .fetch_optional(executor)
            .await
    }

    /// Move pending loans among `ids` that are due on or before `today` to
    /// overdue. Returns the number of rows changed.
    pub async fn mark_overdue<'e>(
        executor: impl PgExecutor<'e>,
        ids: &[DbId],
        today: NaiveDate,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE loans SET status = $1, updated_at = NOW() \
             WHERE id = ANY($2) AND status = $3 AND due_date <= $4",
        )
        .bind(LoanStatus::Overdue.as_str())
        .bind(ids)
        .bind(LoanStatus::Pending.as_str())
        .bind(today)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Stamp `last_notified_date` on an open loan. Returns `false` if no
    /// open loan has that id.
    pub async fn record_notification<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        today: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE loans SET last_notified_date = $2, updated_at = NOW() \
             WHERE id = $1 AND status IN ($3, $4)",
        )
        .bind(id)
        .bind(today)
        .bind(LoanStatus::Pending.as_str())
        .bind(LoanStatus::Overdue.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// List loans with `status`, oldest due date first.
    pub async fn list_by_status<'e>(
        executor: impl PgExecutor<'e>,
        status: LoanStatus,
    ) -> Result<Vec<LoanRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM loans \
             WHERE status = $1 \
             ORDER BY due_date ASC, id ASC"
        );
        sqlx::query_as::<_, LoanRow>(&query)
            .bind(status.as_str())
            .fetch_all(executor)
            .await
    }

    pub async fn list_by_status_and_due_date<'e>(
        executor: impl PgExecutor<'e>,
        status: LoanStatus,
        due_date: NaiveDate,
    ) -> Result<Vec<LoanRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM loans \
             WHERE status = $1 AND due_date = $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, LoanRow>(&query)
            .bind(status.as_str())
            .bind(due_date)
            .fetch_all(executor)
            .await
    }
}
