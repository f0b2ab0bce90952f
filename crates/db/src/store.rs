//! Core repository contracts backed by PostgreSQL.

use async_trait::async_trait;
use bibliotech_core::error::CoreError;
use bibliotech_core::library::{BookCopy, Borrower, StaffUser};
use bibliotech_core::loan::{Loan, LoanStatus, NewLoan};
use bibliotech_core::repository::{
    BorrowerRepository, CopyRepository, LoanRepository, UserRepository,
};
use bibliotech_core::types::DbId;
use chrono::NaiveDate;

use crate::models::loan::LoanRow;
use crate::repositories::{BorrowerRepo, CopyRepo, LoanRepo, UserRepo};
use crate::DbPool;

/// Library store over a connection pool.
#[derive(Clone)]
pub struct PgLibraryStore {
    pool: DbPool,
}

impl PgLibraryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Unique index allowing one open loan per copy.
const OPEN_COPY_CONSTRAINT: &str = "uq_loans_open_copy";

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

fn storage(e: sqlx::Error) -> CoreError {
    tracing::error!(error = %e, "Database error");
    CoreError::Internal(format!("Database error: {e}"))
}

fn is_open_copy_violation(code: Option<&str>, constraint: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION) && constraint == Some(OPEN_COPY_CONSTRAINT)
}

/// Like [`storage`], but a second open loan for `copy_id` is an invalid state.
fn insert_error(e: sqlx::Error, copy_id: DbId) -> CoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if is_open_copy_violation(db_err.code().as_deref(), db_err.constraint()) {
            return CoreError::InvalidState(format!("Copy {copy_id} already has an open loan"));
        }
    }
    storage(e)
}

fn loan_not_found(id: DbId) -> CoreError {
    CoreError::NotFound { entity: "Loan", id }
}

fn into_loans(rows: Vec<LoanRow>) -> Result<Vec<Loan>, CoreError> {
    rows.into_iter().map(Loan::try_from).collect()
}

#[async_trait]
impl LoanRepository for PgLibraryStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Loan>, CoreError> {
        LoanRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .map(Loan::try_from)
            .transpose()
    }

    async fn create(
        &self,
        loan: NewLoan,
        borrower: &Borrower,
        copy: &BookCopy,
    ) -> Result<Loan, CoreError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row = LoanRepo::create(&mut *tx, &loan)
            .await
            .map_err(|e| insert_error(e, loan.copy_id))?;
        BorrowerRepo::set_standing(&mut *tx, borrower.id, borrower.standing)
            .await
            .map_err(storage)?;
        CopyRepo::set_status(&mut *tx, copy.id, copy.status)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Loan::try_from(row)
    }

    async fn save(&self, loan: &Loan) -> Result<Loan, CoreError> {
        LoanRepo::update(&self.pool, loan)
            .await
            .map_err(storage)?
            .ok_or_else(|| loan_not_found(loan.id))
            .and_then(Loan::try_from)
    }

    async fn save_with_parties(
        &self,
        loan: &Loan,
        borrower: &Borrower,
        copy: &BookCopy,
    ) -> Result<Loan, CoreError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row = LoanRepo::update(&mut *tx, loan)
            .await
            .map_err(storage)?
            .ok_or_else(|| loan_not_found(loan.id))?;
        BorrowerRepo::set_standing(&mut *tx, borrower.id, borrower.standing)
            .await
            .map_err(storage)?;
        CopyRepo::set_status(&mut *tx, copy.id, copy.status)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Loan::try_from(row)
    }

    async fn mark_overdue(&self, ids: &[DbId], today: NaiveDate) -> Result<usize, CoreError> {
        let changed = LoanRepo::mark_overdue(&self.pool, ids, today)
            .await
            .map_err(storage)?;
        Ok(changed as usize)
    }

    async fn record_notification(&self, id: DbId, today: NaiveDate) -> Result<bool, CoreError> {
        LoanRepo::record_notification(&self.pool, id, today)
            .await
            .map_err(storage)
    }

    async fn find_by_status(&self, status: LoanStatus) -> Result<Vec<Loan>, CoreError> {
        let rows = LoanRepo::list_by_status(&self.pool, status)
            .await
            .map_err(storage)?;
        into_loans(rows)
    }

    async fn find_by_status_and_due_date(
        &self,
        status: LoanStatus,
        due_date: NaiveDate,
    ) -> Result<Vec<Loan>, CoreError> {
        let rows = LoanRepo::list_by_status_and_due_date(&self.pool, status, due_date)
            .await
            .map_err(storage)?;
        into_loans(rows)
    }
}

#[async_trait]
impl BorrowerRepository for PgLibraryStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Borrower>, CoreError> {
        BorrowerRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .map(Borrower::try_from)
            .transpose()
    }
}

#[async_trait]
impl CopyRepository for PgLibraryStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<BookCopy>, CoreError> {
        CopyRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .map(BookCopy::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepository for PgLibraryStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<StaffUser>, CoreError> {
        let row = UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?;
        Ok(row.map(StaffUser::from))
    }
}
