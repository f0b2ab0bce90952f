//! Loan row model.

use bibliotech_core::error::CoreError;
use bibliotech_core::loan::{Loan, LoanStatus};
use bibliotech_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `loans` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoanRow {
    pub id: DbId,
    pub borrower_id: DbId,
    pub copy_id: DbId,
    pub created_by: DbId,
    pub completed_by: Option<DbId>,
    pub status: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub renewal_count: i32,
    pub observation: Option<String>,
    pub last_notified_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<LoanRow> for Loan {
    type Error = CoreError;

    fn try_from(row: LoanRow) -> Result<Self, Self::Error> {
        let status = LoanStatus::parse(&row.status)
            .map_err(|e| CoreError::Internal(format!("Corrupt loan row {}: {e}", row.id)))?;
        Ok(Loan {
            id: row.id,
            borrower_id: row.borrower_id,
            copy_id: row.copy_id,
            created_by: row.created_by,
            completed_by: row.completed_by,
            status,
            loan_date: row.loan_date,
            due_date: row.due_date,
            completion_date: row.completion_date,
            renewal_count: row.renewal_count,
            observation: row.observation,
            last_notified_date: row.last_notified_date,
        })
    }
}
