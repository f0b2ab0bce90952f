use axum::routing::{get, post};
use axum::Router;

use crate::handlers::loans;
use crate::state::AppState;

/// Loan routes, mounted at `/api/v1/loans`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(loans::create_loan))
        .route("/overdue-sweep", post(loans::run_overdue_sweep))
        .route("/{id}", get(loans::get_loan))
        .route("/{id}/cancel", post(loans::cancel_loan))
        .route("/{id}/complete", post(loans::complete_loan))
        .route("/{id}/renew", post(loans::renew_loan))
}
