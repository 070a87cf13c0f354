use thiserror::Error;

use custody_core::{DomainError, UserId};

use crate::store::StoreError;

/// Every way an authentication or account-administration request can fail.
///
/// All variants are terminal for the request; none is worth retrying.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is suspended")]
    AccountSuspended,

    #[error("session token has expired")]
    ExpiredToken,

    #[error("session token is invalid")]
    InvalidToken,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("email is already in use")]
    EmailTaken,

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("cannot remove the ADMIN role from the last administrator")]
    LastAdminRoleRemoval,

    #[error("cannot suspend the last active administrator")]
    LastActiveAdminSuspension,

    #[error("user {0} not found")]
    NotFound(UserId),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("credential store: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Stable machine-readable code for error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountSuspended => "account_suspended",
            AuthError::ExpiredToken => "expired_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::UsernameTaken => "username_taken",
            AuthError::EmailTaken => "email_taken",
            AuthError::UnknownRole(_) => "unknown_role",
            AuthError::LastAdminRoleRemoval => "last_admin_role_removal",
            AuthError::LastActiveAdminSuspension => "last_active_admin_suspension",
            AuthError::NotFound(_) => "not_found",
            AuthError::Invalid(_) => "validation_error",
            AuthError::Hashing(_) => "hashing_error",
            AuthError::Signing(_) => "signing_error",
            AuthError::Store(_) => "store_error",
        }
    }
}
