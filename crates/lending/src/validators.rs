//! Lookups and eligibility checks run before a loan changes state.
//!
//! Each validator resolves an id to an entity (`NotFound` when missing) and
//! checks the precondition of the requested operation. The `mark_as_*`
//! helpers apply the side effects a loan has on its borrower and copy; they
//! only mutate the value, persistence happens in the facade's single write.

use std::sync::Arc;

use bibliotech_core::error::CoreError;
use bibliotech_core::library::{BookCopy, Borrower, BorrowerStanding, CopyStatus};
use bibliotech_core::loan::{Loan, LoanStatus};
use bibliotech_core::repository::{BorrowerRepository, CopyRepository, LoanRepository};
use bibliotech_core::types::DbId;

// ---------------------------------------------------------------------------
// Borrower
// ---------------------------------------------------------------------------

pub struct BorrowerValidator {
    repo: Arc<dyn BorrowerRepository>,
}

impl BorrowerValidator {
    pub fn new(repo: Arc<dyn BorrowerRepository>) -> Self {
        Self { repo }
    }

    pub async fn find(&self, id: DbId) -> Result<Borrower, CoreError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Borrower",
                id,
            })
    }

    /// Resolve a borrower that may take a new loan.
    pub async fn validate_for_loan(&self, id: DbId) -> Result<Borrower, CoreError> {
        let borrower = self.find(id).await?;
        borrower.ensure_eligible()?;
        Ok(borrower)
    }

    pub fn mark_as_indebted(&self, borrower: &mut Borrower) {
        borrower.standing = BorrowerStanding::Indebted;
    }

    pub fn mark_as_regular(&self, borrower: &mut Borrower) {
        borrower.standing = BorrowerStanding::Regular;
    }

    pub fn mark_as_irregular(&self, borrower: &mut Borrower) {
        borrower.standing = BorrowerStanding::Irregular;
    }
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

pub struct CopyValidator {
    repo: Arc<dyn CopyRepository>,
}

impl CopyValidator {
    pub fn new(repo: Arc<dyn CopyRepository>) -> Self {
        Self { repo }
    }

    pub async fn find(&self, id: DbId) -> Result<BookCopy, CoreError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Copy", id })
    }

    /// Resolve a copy that is on the shelf.
    pub async fn validate_availability(&self, id: DbId) -> Result<BookCopy, CoreError> {
        let copy = self.find(id).await?;
        copy.ensure_available()?;
        Ok(copy)
    }

    pub fn mark_as_loaned(&self, copy: &mut BookCopy) {
        copy.status = CopyStatus::Loaned;
    }

    pub fn mark_as_available(&self, copy: &mut BookCopy) {
        copy.status = CopyStatus::Available;
    }

    pub fn mark_as_lost(&self, copy: &mut BookCopy) {
        copy.status = CopyStatus::Lost;
    }
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

pub struct LoanValidator {
    repo: Arc<dyn LoanRepository>,
}

impl LoanValidator {
    pub fn new(repo: Arc<dyn LoanRepository>) -> Self {
        Self { repo }
    }

    pub async fn validate_exists(&self, id: DbId) -> Result<Loan, CoreError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Loan", id })
    }

    /// Pending and overdue loans can be cancelled.
    pub fn validate_for_cancellation(&self, loan: &Loan) -> Result<(), CoreError> {
        require_open(loan, "cancelled")
    }

    /// Pending and overdue loans can be completed.
    pub fn validate_for_completion(&self, loan: &Loan) -> Result<(), CoreError> {
        require_open(loan, "completed")
    }

    /// Pending and overdue loans can be renewed.
    pub fn validate_for_renewal(&self, loan: &Loan) -> Result<(), CoreError> {
        require_open(loan, "renewed")
    }
}

fn require_open(loan: &Loan, action: &str) -> Result<(), CoreError> {
    match loan.status {
        LoanStatus::Pending | LoanStatus::Overdue => Ok(()),
        status => Err(CoreError::InvalidState(format!(
            "Loan {} is {status} and cannot be {action}",
            loan.id
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
