//! Overdue sweep.
//!
//! One run has two phases:
//!
//! 1. pending loans whose due date is today or earlier become overdue;
//! 2. every overdue loan gets an overdue notice and every pending loan due
//!    tomorrow gets a reminder.
//!
//! A loan is notified at most once per day: `last_notified_date` is set
//! only after a successful send and a loan already notified today is
//! skipped. Loans whose notice could not be confirmed are returned so the
//! caller can report or retry them.
//!
//! Runs on one [`OverdueSweep`] never overlap. Writes only touch the
//! status of loans still pending and the notice date of loans still open,
//! so staff actions taken while a notice is in flight are kept.

use std::sync::Arc;

use bibliotech_core::clock::Clock;
use bibliotech_core::error::CoreError;
use bibliotech_core::library::{BookCopy, Borrower};
use bibliotech_core::loan::{add_days, Loan, LoanStatus};
use bibliotech_core::repository::{BorrowerRepository, CopyRepository, LoanRepository};
use bibliotech_core::templates::{compose, NoticeFields, NoticeTemplate};
use bibliotech_core::types::DbId;
use bibliotech_events::{ChannelSender, Recipient};
use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::stores::LibraryStores;

/// Compact projection of a loan whose notice was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnnotifiedLoan {
    pub loan_id: DbId,
    pub borrower_id: DbId,
    /// `None` when the borrower could not be loaded.
    pub borrower_name: Option<String>,
    /// `None` when the copy could not be loaded.
    pub copy_title: Option<String>,
    pub status: LoanStatus,
    pub due_date: NaiveDate,
    pub reason: String,
}

fn fail(
    loan: &Loan,
    borrower: Option<&Borrower>,
    copy: Option<&BookCopy>,
    reason: String,
) -> UnnotifiedLoan {
    UnnotifiedLoan {
        loan_id: loan.id,
        borrower_id: loan.borrower_id,
        borrower_name: borrower.map(|b| b.name.clone()),
        copy_title: copy.map(|c| c.title.clone()),
        status: loan.status,
        due_date: loan.due_date,
        reason,
    }
}

/// Counters for one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Pending loans moved to overdue.
    pub transitioned: usize,
    pub notified: usize,
    /// Loans already notified today.
    pub skipped: usize,
    pub unnotified: Vec<UnnotifiedLoan>,
}

pub struct OverdueSweep {
    loans: Arc<dyn LoanRepository>,
    borrowers: Arc<dyn BorrowerRepository>,
    copies: Arc<dyn CopyRepository>,
    notifier: Arc<dyn ChannelSender>,
    clock: Arc<dyn Clock>,
    library_name: String,
    running: Mutex<()>,
}

impl OverdueSweep {
    pub fn new(
        stores: LibraryStores,
        notifier: Arc<dyn ChannelSender>,
        clock: Arc<dyn Clock>,
        library_name: impl Into<String>,
    ) -> Self {
        Self {
            loans: stores.loans,
            borrowers: stores.borrowers,
            copies: stores.copies,
            notifier,
            clock,
            library_name: library_name.into(),
            running: Mutex::new(()),
        }
    }

    /// Run both phases and return the loans that could not be notified.
    pub async fn run(&self) -> Result<Vec<UnnotifiedLoan>, CoreError> {
        Ok(self.run_report().await?.unnotified)
    }

    /// Run both phases and return the full report.
    ///
    /// Storage failures while loading or transitioning loans abort the run;
    /// failures for a single notice only land in the report.
    pub async fn run_report(&self) -> Result<SweepReport, CoreError> {
        let _running = self.running.lock().await;
        let today = self.clock.today();
        let mut report = SweepReport {
            transitioned: self.mark_overdue(today).await?,
            ..SweepReport::default()
        };

        let overdue = self.loans.find_by_status(LoanStatus::Overdue).await?;
        let due_tomorrow = self
            .loans
            .find_by_status_and_due_date(LoanStatus::Pending, add_days(today, 1)?)
            .await?;

        let batch = overdue
            .into_iter()
            .map(|loan| (loan, NoticeTemplate::Overdue))
            .chain(
                due_tomorrow
                    .into_iter()
                    .map(|loan| (loan, NoticeTemplate::DueTomorrow)),
            );

        for (loan, template) in batch {
            if loan.was_notified_on(today) {
                report.skipped += 1;
                continue;
            }
            match self.notify(loan, template, today).await {
                Ok(()) => report.notified += 1,
                Err(unnotified) => {
                    tracing::warn!(
                        loan_id = unnotified.loan_id,
                        template = template.id(),
                        reason = %unnotified.reason,
                        "Loan notice not delivered"
                    );
                    report.unnotified.push(unnotified);
                }
            }
        }

        tracing::info!(
            %today,
            transitioned = report.transitioned,
            notified = report.notified,
            skipped = report.skipped,
            unnotified = report.unnotified.len(),
            "Overdue sweep finished"
        );
        Ok(report)
    }

    /// Phase 1. Returns how many loans changed status.
    async fn mark_overdue(&self, today: NaiveDate) -> Result<usize, CoreError> {
        let due: Vec<DbId> = self
            .loans
            .find_by_status(LoanStatus::Pending)
            .await?
            .into_iter()
            .filter_map(|mut loan| loan.mark_overdue_if_due(today).then_some(loan.id))
            .collect();

        if due.is_empty() {
            return Ok(0);
        }
        let changed = self.loans.mark_overdue(&due, today).await?;
        tracing::debug!(candidates = due.len(), changed, "Loans marked overdue");
        Ok(changed)
    }

    /// Send one notice and record it. Any failure yields the projection.
    async fn notify(
        &self,
        loan: Loan,
        template: NoticeTemplate,
        today: NaiveDate,
    ) -> Result<(), UnnotifiedLoan> {
        let borrower = match self.borrowers.find_by_id(loan.borrower_id).await {
            Ok(Some(b)) => b,
            Ok(None) => {
                let reason = format!("Borrower {} not found", loan.borrower_id);
                return Err(fail(&loan, None, None, reason));
            }
            Err(e) => return Err(fail(&loan, None, None, e.to_string())),
        };
        let copy = match self.copies.find_by_id(loan.copy_id).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                let reason = format!("Copy {} not found", loan.copy_id);
                return Err(fail(&loan, Some(&borrower), None, reason));
            }
            Err(e) => return Err(fail(&loan, Some(&borrower), None, e.to_string())),
        };

        let message = compose(
            template,
            &NoticeFields {
                borrower_name: &borrower.name,
                title: &copy.title,
                loan_date: loan.loan_date,
                due_date: loan.due_date,
                library_name: &self.library_name,
                observation: None,
            },
        );

        if let Err(e) = self
            .notifier
            .send(&Recipient::from(&borrower), &message.subject, &message.body)
            .await
        {
            return Err(fail(&loan, Some(&borrower), Some(&copy), e.to_string()));
        }

        match self.loans.record_notification(loan.id, today).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(loan_id = loan.id, "Loan closed while its notice was sent");
            }
            Err(e) => {
                let reason = format!("Notice sent but not recorded: {e}");
                return Err(fail(&loan, Some(&borrower), Some(&copy), reason));
            }
        }

        tracing::debug!(loan_id = loan.id, template = template.id(), "Loan notice delivered");
        Ok(())
    }
}
