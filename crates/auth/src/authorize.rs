use thiserror::Error;

use crate::roles::role_labels;
use crate::{Action, RoleSet, UserClaims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: '{0}' requires one of the roles {1}")]
    Forbidden(Action, String),
}

/// Decide whether `claims` may act under `required`.
///
/// True iff the two role sets intersect. An empty set on either side denies.
///
/// - No IO
/// - No panics
pub fn authorize(claims: &UserClaims, required: &RoleSet) -> bool {
    !claims.roles.is_disjoint(required)
}

/// Gate an [`Action`] for the caller.
pub fn require(claims: &UserClaims, action: Action) -> Result<(), AuthzError> {
    let required = action.required_roles();
    if authorize(claims, &required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(action, role_labels(&required).join(", ")))
    }
}
