//! Stateless repositories, one per table.
//!
//! Every method takes an executor so the same query runs against the pool
//! or inside a caller-owned transaction.

pub mod borrower_repo;
pub mod copy_repo;
pub mod loan_repo;
pub mod user_repo;

pub use borrower_repo::BorrowerRepo;
pub use copy_repo::CopyRepo;
pub use loan_repo::LoanRepo;
pub use user_repo::UserRepo;
