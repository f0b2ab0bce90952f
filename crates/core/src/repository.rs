//! Persistence contracts consumed by the lending core.
//!
//! Implemented by the PostgreSQL store in `bibliotech-db` and by the
//! in-memory store in `bibliotech-lending`. Every method reports storage
//! failures as [`CoreError::Internal`]; a missing row is `Ok(None)` so the
//! caller decides which entity name to report.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::CoreError;
use crate::library::{BookCopy, Borrower, StaffUser};
use crate::loan::{Loan, LoanStatus, NewLoan};
use crate::types::DbId;

#[async_trait]
pub trait LoanRepository: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Loan>, CoreError>;

    /// Insert a new pending loan together with the borrower and copy side
    /// effects, as one unit of work.
    async fn create(
        &self,
        loan: NewLoan,
        borrower: &Borrower,
        copy: &BookCopy,
    ) -> Result<Loan, CoreError>;

    /// Persist the loan row only.
    async fn save(&self, loan: &Loan) -> Result<Loan, CoreError>;

    /// Persist the loan row plus the borrower standing and copy status, as
    /// one unit of work.
    async fn save_with_parties(
        &self,
        loan: &Loan,
        borrower: &Borrower,
        copy: &BookCopy,
    ) -> Result<Loan, CoreError>;

    /// Move the listed loans to overdue, as one unit of work.
    ///
    /// Only rows still pending with a due date on or before `today` change,
    /// so a loan closed or renewed since it was read is left alone. Returns
    /// how many loans changed.
    async fn mark_overdue(&self, ids: &[DbId], today: NaiveDate) -> Result<usize, CoreError>;

    /// Set `last_notified_date` on an open loan and nothing else.
    ///
    /// Returns `false` if the loan is missing or no longer open.
    async fn record_notification(&self, id: DbId, today: NaiveDate) -> Result<bool, CoreError>;

    async fn find_by_status(&self, status: LoanStatus) -> Result<Vec<Loan>, CoreError>;

    async fn find_by_status_and_due_date(
        &self,
        status: LoanStatus,
        due_date: NaiveDate,
    ) -> Result<Vec<Loan>, CoreError>;
}

#[async_trait]
pub trait BorrowerRepository: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Borrower>, CoreError>;
}

#[async_trait]
pub trait CopyRepository: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> Result<Option<BookCopy>, CoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> Result<Option<StaffUser>, CoreError>;
}
