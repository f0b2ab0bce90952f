//! Handlers for the loan lifecycle.
//!
//! Every state-changing endpoint goes through the [`LoanFacade`]
//! (`bibliotech_lending::LoanFacade`) with the authenticated staff member
//! as the acting user, and answers with `{ message, loan }`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bibliotech_core::loan::Loan;
use bibliotech_core::types::DbId;
use bibliotech_events::LoanEventType;
use bibliotech_lending::{CompleteLoan, CreateLoan};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest observation accepted when closing a loan.
const MAX_OBSERVATION_CHARS: u64 = 500;

/// Body of a state-changing response.
#[derive(Debug, Serialize)]
pub struct LoanActionResponse {
    pub message: &'static str,
    pub loan: Loan,
}

impl LoanActionResponse {
    fn new(event_type: LoanEventType, loan: Loan) -> DataResponse<Self> {
        DataResponse {
            data: Self {
                message: event_type.success_message(),
                loan,
            },
        }
    }
}

/// Request body for `POST /loans/{id}/complete`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompleteLoanRequest {
    #[validate(length(max = MAX_OBSERVATION_CHARS))]
    #[serde(default)]
    pub observation: Option<String>,
    #[serde(default)]
    pub lost: bool,
}

impl From<CompleteLoanRequest> for CompleteLoan {
    fn from(req: CompleteLoanRequest) -> Self {
        CompleteLoan {
            observation: req.observation,
            lost: req.lost,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// GET /api/v1/loans/{id}
pub async fn get_loan(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let loan = state.facade.find_loan(id).await?;
    Ok(Json(DataResponse { data: loan }))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/loans
///
/// Lend a copy to a borrower. `due_date` defaults to the standard period.
pub async fn create_loan(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateLoan>,
) -> AppResult<impl IntoResponse> {
    let loan = state.facade.create_loan(input, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(LoanActionResponse::new(LoanEventType::Created, loan)),
    ))
}

/// POST /api/v1/loans/{id}/cancel
pub async fn cancel_loan(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let loan = state.facade.cancel_loan(id, &user).await?;
    Ok(Json(LoanActionResponse::new(LoanEventType::Cancelled, loan)))
}

/// POST /api/v1/loans/{id}/complete
///
/// Close the loan as returned, or as lost when `lost` is true.
pub async fn complete_loan(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteLoanRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let event_type = if input.lost {
        LoanEventType::Lost
    } else {
        LoanEventType::Completed
    };
    let loan = state.facade.complete_loan(id, input.into(), &user).await?;
    Ok(Json(LoanActionResponse::new(event_type, loan)))
}

/// POST /api/v1/loans/{id}/renew
pub async fn renew_loan(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let loan = state.facade.renew_loan(id, &user).await?;
    Ok(Json(LoanActionResponse::new(LoanEventType::Renewed, loan)))
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// POST /api/v1/loans/overdue-sweep
///
/// Run the overdue sweep now. The report lists the loans whose notice
/// could not be delivered.
pub async fn run_overdue_sweep(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(user_id = user.user_id, "Manual overdue sweep requested");
    let report = state.sweep.run_report().await?;
    Ok(Json(DataResponse { data: report }))
}
