//! In-process observer registry for loan lifecycle events.
//!
//! [`EventBus`] is owned by the loan facade. Observers are attached and
//! detached through the facade; [`EventBus::notify`] delivers each
//! [`LoanEvent`] to every observer in registration order and isolates
//! observer failures from each other and from the caller.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bibliotech_core::error::CoreError;
use bibliotech_core::loan::Loan;
use bibliotech_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::Serialize;

use crate::delivery::DeliveryError;

// ---------------------------------------------------------------------------
// LoanEvent
// ---------------------------------------------------------------------------

/// Kind of lifecycle change that produced a [`LoanEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanEventType {
    Created,
    Cancelled,
    Completed,
    Lost,
    Renewed,
}

impl LoanEventType {
    /// Dot-separated event name, e.g. `"loan.created"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "loan.created",
            Self::Cancelled => "loan.cancelled",
            Self::Completed => "loan.completed",
            Self::Lost => "loan.lost",
            Self::Renewed => "loan.renewed",
        }
    }

    /// Human-readable confirmation for the operation that emitted the event.
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Created => "Loan created successfully.",
            Self::Cancelled => "Loan cancelled successfully.",
            Self::Completed => "Loan completed successfully.",
            Self::Lost => "Loan closed as lost successfully.",
            Self::Renewed => "Loan renewed successfully.",
        }
    }
}

impl fmt::Display for LoanEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan lifecycle change, broadcast once after the change was persisted.
///
/// Constructed via [`LoanEvent::new`] and enriched with
/// [`with_note`](LoanEvent::with_note) and
/// [`with_actor`](LoanEvent::with_actor).
#[derive(Debug, Clone, Serialize)]
pub struct LoanEvent {
    /// Snapshot of the loan as persisted.
    pub loan: Loan,

    pub event_type: LoanEventType,

    /// Optional free text, e.g. the completion observation.
    pub note: Option<String>,

    /// Staff member that triggered the change.
    pub actor_user_id: Option<DbId>,

    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl LoanEvent {
    pub fn new(loan: Loan, event_type: LoanEventType) -> Self {
        Self {
            loan,
            event_type,
            note: None,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Failure reported by an observer. Logged by the bus, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("Lookup failed: {0}")]
    Lookup(#[from] CoreError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// A listener reacting to loan lifecycle events.
#[async_trait]
pub trait LoanObserver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn on_event(&self, event: &LoanEvent) -> Result<(), ObserverError>;
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Ordered registry of [`LoanObserver`]s.
///
/// The list is only mutated through [`attach`](Self::attach) and
/// [`detach`](Self::detach); [`notify`](Self::notify) works on a snapshot
/// so no lock is held while observers run.
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn LoanObserver>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Attaching an observer that is already
    /// registered (same allocation) is a no-op.
    ///
    /// Returns `true` if the observer was added.
    pub fn attach(&self, observer: Arc<dyn LoanObserver>) -> bool {
        let mut observers = self.write();
        if observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            return false;
        }
        tracing::debug!(observer = observer.name(), "Observer attached");
        observers.push(observer);
        true
    }

    /// Unregister an observer. Unknown observers are ignored.
    ///
    /// Returns `true` if the observer was removed.
    pub fn detach(&self, observer: &Arc<dyn LoanObserver>) -> bool {
        let mut observers = self.write();
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        let removed = observers.len() != before;
        if removed {
            tracing::debug!(observer = observer.name(), "Observer detached");
        }
        removed
    }

    /// Deliver `event` to every observer in registration order.
    ///
    /// A failing observer is logged and skipped; the remaining observers
    /// still receive the event.
    pub async fn notify(&self, event: &LoanEvent) {
        let observers: Vec<Arc<dyn LoanObserver>> = self.read().clone();

        tracing::debug!(
            observer_count = observers.len(),
            event_type = %event.event_type,
            loan_id = event.loan.id,
            "Notifying observers"
        );

        for observer in &observers {
            if let Err(e) = observer.on_event(event).await {
                tracing::error!(
                    observer = observer.name(),
                    event_type = %event.event_type,
                    loan_id = event.loan.id,
                    error = %e,
                    "Observer failed to handle loan event"
                );
            }
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn LoanObserver>>> {
        self.observers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn LoanObserver>>> {
        self.observers.write().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
