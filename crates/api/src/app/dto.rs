use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use custody_auth::{SignIn, SignUp, UserClaims, UserStatus, UserSummary, role_labels};
use custody_core::UserId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub pending: bool,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub status: UserStatus,
    pub message: &'static str,
}

impl From<SignIn> for SigninResponse {
    fn from(sign_in: SignIn) -> Self {
        let roles = sign_in.claims.role_labels();
        Self {
            token: sign_in.token.token,
            token_type: "Bearer",
            expires_at: sign_in.token.expires_at,
            id: sign_in.claims.id,
            username: sign_in.claims.username,
            email: sign_in.claims.email,
            roles,
            status: sign_in.claims.status,
            message: "Signed in successfully.",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub administrator: bool,
}

impl From<SignUp> for SignupResponse {
    fn from(sign_up: SignUp) -> Self {
        Self {
            message: sign_up.outcome.message(),
            administrator: sign_up.outcome.is_administrator(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Caller's claims as seen by `/api/auth/me`.
#[derive(Debug, Serialize)]
pub struct ClaimsResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub status: UserStatus,
}

impl From<&UserClaims> for ClaimsResponse {
    fn from(claims: &UserClaims) -> Self {
        Self {
            id: claims.id,
            username: claims.username.clone(),
            email: claims.email.clone(),
            roles: claims.role_labels(),
            status: claims.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserSummaryResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub status: UserStatus,
    pub pending: bool,
    pub registered_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<UserSummary> for UserSummaryResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            roles: role_labels(&user.roles),
            pending: user.roles.is_empty(),
            username: user.username,
            email: user.email,
            status: user.status,
            registered_at: user.registered_at,
            last_login_at: user.last_login_at,
        }
    }
}
