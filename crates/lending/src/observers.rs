//! Stock lifecycle observers.

use std::sync::Arc;

use async_trait::async_trait;
use bibliotech_core::error::CoreError;
use bibliotech_core::repository::{BorrowerRepository, CopyRepository};
use bibliotech_core::templates::{compose, NoticeFields, NoticeTemplate};
use bibliotech_events::{
    ChannelSender, LoanEvent, LoanEventType, LoanObserver, ObserverError, Recipient,
};

use crate::stores::LibraryStores;

// ---------------------------------------------------------------------------
// NotificationObserver
// ---------------------------------------------------------------------------

/// Sends the borrower a receipt for every lifecycle change.
pub struct NotificationObserver {
    borrowers: Arc<dyn BorrowerRepository>,
    copies: Arc<dyn CopyRepository>,
    notifier: Arc<dyn ChannelSender>,
    library_name: String,
}

impl NotificationObserver {
    pub fn new(
        stores: &LibraryStores,
        notifier: Arc<dyn ChannelSender>,
        library_name: impl Into<String>,
    ) -> Self {
        Self {
            borrowers: Arc::clone(&stores.borrowers),
            copies: Arc::clone(&stores.copies),
            notifier,
            library_name: library_name.into(),
        }
    }

    fn template_for(event_type: LoanEventType) -> NoticeTemplate {
        match event_type {
            LoanEventType::Created => NoticeTemplate::LoanCreated,
            LoanEventType::Cancelled => NoticeTemplate::LoanCancelled,
            LoanEventType::Completed => NoticeTemplate::LoanReturned,
            LoanEventType::Lost => NoticeTemplate::LoanLost,
            LoanEventType::Renewed => NoticeTemplate::LoanRenewed,
        }
    }
}

#[async_trait]
impl LoanObserver for NotificationObserver {
    fn name(&self) -> &str {
        "notification"
    }

    async fn on_event(&self, event: &LoanEvent) -> Result<(), ObserverError> {
        let loan = &event.loan;
        let borrower = self
            .borrowers
            .find_by_id(loan.borrower_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Borrower",
                id: loan.borrower_id,
            })?;
        let copy = self
            .copies
            .find_by_id(loan.copy_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Copy",
                id: loan.copy_id,
            })?;

        let template = Self::template_for(event.event_type);
        let message = compose(
            template,
            &NoticeFields {
                borrower_name: &borrower.name,
                title: &copy.title,
                loan_date: loan.loan_date,
                due_date: loan.due_date,
                library_name: &self.library_name,
                observation: event.note.as_deref(),
            },
        );

        self.notifier
            .send(&Recipient::from(&borrower), &message.subject, &message.body)
            .await?;

        tracing::debug!(
            loan_id = loan.id,
            template = template.id(),
            channel = %self.notifier.kind(),
            "Loan receipt sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AuditObserver
// ---------------------------------------------------------------------------

/// Writes one structured audit line per lifecycle change.
#[derive(Debug, Default)]
pub struct AuditObserver;

#[async_trait]
impl LoanObserver for AuditObserver {
    fn name(&self) -> &str {
        "audit"
    }

    async fn on_event(&self, event: &LoanEvent) -> Result<(), ObserverError> {
        tracing::info!(
            target: "bibliotech::audit",
            event_type = %event.event_type,
            loan_id = event.loan.id,
            borrower_id = event.loan.borrower_id,
            copy_id = event.loan.copy_id,
            status = %event.loan.status,
            actor_user_id = event.actor_user_id,
            note = event.note.as_deref(),
            at = %event.timestamp,
            "Loan lifecycle event"
        );
        Ok(())
    }
}
