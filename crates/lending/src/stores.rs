use std::sync::Arc;

use bibliotech_core::repository::{
    BorrowerRepository, CopyRepository, LoanRepository, UserRepository,
};

/// The repositories the lending services read and write.
#[derive(Clone)]
pub struct LibraryStores {
    pub loans: Arc<dyn LoanRepository>,
    pub borrowers: Arc<dyn BorrowerRepository>,
    pub copies: Arc<dyn CopyRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl LibraryStores {
    /// Use one store for every repository.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: LoanRepository + BorrowerRepository + CopyRepository + UserRepository + 'static,
    {
        Self {
            loans: store.clone(),
            borrowers: store.clone(),
            copies: store.clone(),
            users: store,
        }
    }
}
