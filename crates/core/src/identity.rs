//! Resolution of the staff member acting in the current operation.

use crate::error::CoreError;
use crate::types::DbId;

/// Supplies the acting user id for one operation context.
///
/// The HTTP layer implements this on its authenticated-user extractor;
/// batch jobs and tests use [`ActingUser`].
pub trait IdentityResolver: Send + Sync {
    fn acting_user_id(&self) -> Result<DbId, CoreError>;
}

/// A fixed, already-known acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub DbId);

impl IdentityResolver for ActingUser {
    fn acting_user_id(&self) -> Result<DbId, CoreError> {
        Ok(self.0)
    }
}
