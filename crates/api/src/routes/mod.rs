pub mod health;
pub mod loans;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /loans                          create (POST)
/// /loans/overdue-sweep            run the sweep now (POST)
/// /loans/{id}                     get
/// /loans/{id}/cancel              cancel (POST)
/// /loans/{id}/complete            return or declare lost (POST)
/// /loans/{id}/renew               renew (POST)
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/loans", loans::router())
}
