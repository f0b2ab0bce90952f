//! Bibliotech domain core.
//!
//! Pure domain logic with no database or transport dependencies:
//!
//! - [`loan`]: the [`Loan`](loan::Loan) entity and its state machine.
//! - [`library`]: borrowers, copies and staff users referenced by loans.
//! - [`repository`]: collaborator contracts implemented by the `db` crate
//!   and by in-memory stores.
//! - [`templates`]: pure message composition for loan notices.

pub mod channels;
pub mod clock;
pub mod error;
pub mod identity;
pub mod library;
pub mod loan;
pub mod repository;
pub mod templates;
pub mod types;
