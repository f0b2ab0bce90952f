//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bibliotech_core::error::CoreError;
use bibliotech_core::identity::IdentityResolver;
use bibliotech_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Staff member extracted from a JWT Bearer token in the `Authorization` header.
///
/// Handlers pass it straight to the loan facade as the operation's
/// [`IdentityResolver`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The staff user's internal database id (from `claims.sub`).
    pub user_id: DbId,
}

impl IdentityResolver for AuthUser {
    fn acting_user_id(&self) -> Result<DbId, CoreError> {
        Ok(self.user_id)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
