//! Single entry point for state-changing loan operations.
//!
//! Every operation follows the same shape: resolve the acting user,
//! validate, apply the transition on owned values, persist with one
//! repository call, then broadcast exactly one [`LoanEvent`]. A failure at
//! any step returns the error and emits nothing.

use std::sync::Arc;

use bibliotech_core::clock::Clock;
use bibliotech_core::error::CoreError;
use bibliotech_core::identity::IdentityResolver;
use bibliotech_core::loan::{Loan, LoanStatus, NewLoan};
use bibliotech_core::repository::{LoanRepository, UserRepository};
use bibliotech_core::types::DbId;
use bibliotech_events::{EventBus, LoanEvent, LoanEventType, LoanObserver};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::stores::LibraryStores;
use crate::validators::{BorrowerValidator, CopyValidator, LoanValidator};

/// Input for [`LoanFacade::create_loan`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoan {
    pub borrower_id: DbId,
    pub copy_id: DbId,
    /// Defaults to the standard loan period.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Input for [`LoanFacade::complete_loan`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteLoan {
    #[serde(default)]
    pub observation: Option<String>,
    /// Close the loan with the copy declared lost.
    #[serde(default)]
    pub lost: bool,
}

pub struct LoanFacade {
    loans: Arc<dyn LoanRepository>,
    users: Arc<dyn UserRepository>,
    borrower_validator: BorrowerValidator,
    copy_validator: CopyValidator,
    loan_validator: LoanValidator,
    clock: Arc<dyn Clock>,
    bus: EventBus,
}

impl LoanFacade {
    pub fn new(stores: LibraryStores, clock: Arc<dyn Clock>) -> Self {
        Self {
            borrower_validator: BorrowerValidator::new(stores.borrowers),
            copy_validator: CopyValidator::new(stores.copies),
            loan_validator: LoanValidator::new(Arc::clone(&stores.loans)),
            loans: stores.loans,
            users: stores.users,
            clock,
            bus: EventBus::new(),
        }
    }

    // -- observers ----------------------------------------------------------

    /// Register a lifecycle observer. Returns `false` if already registered.
    pub fn attach(&self, observer: Arc<dyn LoanObserver>) -> bool {
        self.bus.attach(observer)
    }

    /// Unregister a lifecycle observer. Returns `false` if it was unknown.
    pub fn detach(&self, observer: &Arc<dyn LoanObserver>) -> bool {
        self.bus.detach(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.bus.observer_count()
    }

    // -- queries ------------------------------------------------------------

    pub async fn find_loan(&self, id: DbId) -> Result<Loan, CoreError> {
        self.loan_validator.validate_exists(id).await
    }

    // -- operations ---------------------------------------------------------

    /// Lend a copy to a borrower.
    ///
    /// The borrower becomes indebted and the copy loaned in the same write
    /// as the new pending loan.
    pub async fn create_loan(
        &self,
        input: CreateLoan,
        identity: &dyn IdentityResolver,
    ) -> Result<Loan, CoreError> {
        let mut borrower = self
            .borrower_validator
            .validate_for_loan(input.borrower_id)
            .await?;
        let mut copy = self
            .copy_validator
            .validate_availability(input.copy_id)
            .await?;
        let actor = self.resolve_actor(identity).await?;

        let new = NewLoan::new(
            borrower.id,
            copy.id,
            actor,
            self.clock.today(),
            input.due_date,
        )?;
        self.borrower_validator.mark_as_indebted(&mut borrower);
        self.copy_validator.mark_as_loaned(&mut copy);

        let loan = self.loans.create(new, &borrower, &copy).await?;

        tracing::info!(
            loan_id = loan.id,
            borrower_id = loan.borrower_id,
            copy_id = loan.copy_id,
            due_date = %loan.due_date,
            actor,
            "Loan created"
        );
        self.emit(LoanEvent::new(loan.clone(), LoanEventType::Created).with_actor(actor))
            .await;
        Ok(loan)
    }

    /// Cancel an open loan, releasing the borrower and the copy.
    pub async fn cancel_loan(
        &self,
        id: DbId,
        identity: &dyn IdentityResolver,
    ) -> Result<Loan, CoreError> {
        let actor = self.resolve_actor(identity).await?;
        let mut loan = self.loan_validator.validate_exists(id).await?;
        self.loan_validator.validate_for_cancellation(&loan)?;

        let mut borrower = self.borrower_validator.find(loan.borrower_id).await?;
        let mut copy = self.copy_validator.find(loan.copy_id).await?;

        loan.cancel(actor, self.clock.today())?;
        self.borrower_validator.mark_as_regular(&mut borrower);
        self.copy_validator.mark_as_available(&mut copy);

        let loan = self
            .loans
            .save_with_parties(&loan, &borrower, &copy)
            .await?;

        tracing::info!(loan_id = loan.id, actor, "Loan cancelled");
        self.emit(LoanEvent::new(loan.clone(), LoanEventType::Cancelled).with_actor(actor))
            .await;
        Ok(loan)
    }

    /// Close an open loan as returned, or as lost when `input.lost` is set.
    ///
    /// A lost copy leaves the borrower irregular; a return leaves them
    /// regular with the copy back on the shelf.
    pub async fn complete_loan(
        &self,
        id: DbId,
        input: CompleteLoan,
        identity: &dyn IdentityResolver,
    ) -> Result<Loan, CoreError> {
        let actor = self.resolve_actor(identity).await?;
        let mut loan = self.loan_validator.validate_exists(id).await?;
        self.loan_validator.validate_for_completion(&loan)?;

        let mut borrower = self.borrower_validator.find(loan.borrower_id).await?;
        let mut copy = self.copy_validator.find(loan.copy_id).await?;

        let observation = input
            .observation
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        let status = loan.complete(actor, self.clock.today(), observation.clone(), input.lost)?;

        let event_type = if status == LoanStatus::Lost {
            self.borrower_validator.mark_as_irregular(&mut borrower);
            self.copy_validator.mark_as_lost(&mut copy);
            LoanEventType::Lost
        } else {
            self.borrower_validator.mark_as_regular(&mut borrower);
            self.copy_validator.mark_as_available(&mut copy);
            LoanEventType::Completed
        };

        let loan = self
            .loans
            .save_with_parties(&loan, &borrower, &copy)
            .await?;

        tracing::info!(loan_id = loan.id, status = %loan.status, actor, "Loan completed");
        self.emit(
            LoanEvent::new(loan.clone(), event_type)
                .with_note(observation)
                .with_actor(actor),
        )
        .await;
        Ok(loan)
    }

    /// Extend an open loan. An overdue loan goes back to pending.
    pub async fn renew_loan(
        &self,
        id: DbId,
        identity: &dyn IdentityResolver,
    ) -> Result<Loan, CoreError> {
        let actor = self.resolve_actor(identity).await?;
        let mut loan = self.loan_validator.validate_exists(id).await?;
        self.loan_validator.validate_for_renewal(&loan)?;

        loan.renew(self.clock.today())?;
        let loan = self.loans.save(&loan).await?;

        tracing::info!(
            loan_id = loan.id,
            due_date = %loan.due_date,
            renewal_count = loan.renewal_count,
            actor,
            "Loan renewed"
        );
        self.emit(LoanEvent::new(loan.clone(), LoanEventType::Renewed).with_actor(actor))
            .await;
        Ok(loan)
    }

    // -- helpers ------------------------------------------------------------

    async fn resolve_actor(&self, identity: &dyn IdentityResolver) -> Result<DbId, CoreError> {
        let id = identity.acting_user_id()?;
        self.users
            .find_by_id(id)
            .await?
            .map(|user| user.id)
            .ok_or(CoreError::NotFound { entity: "User", id })
    }

    async fn emit(&self, event: LoanEvent) {
        self.bus.notify(&event).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
