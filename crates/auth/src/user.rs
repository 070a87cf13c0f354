//! Staff account record.
//!
//! Accounts are created at sign-up, mutated by administrators (roles, status)
//! and by successful sign-ins (last login), and never hard-deleted.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use custody_core::{DomainError, UserId};

use crate::{Role, RoleSet};

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    /// User can sign in and use issued tokens.
    #[default]
    Active,
    /// User cannot sign in; existing tokens are refused by the request gate.
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            other => Err(DomainError::validation(format!("unknown status '{other}'"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted staff account.
///
/// # Invariants
/// - `username` and `email` are unique across the store (checked at sign-up,
///   enforced again by the store on insert).
/// - `password_hash` is a PHC string; the plain password is never kept.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
    pub status: UserStatus,
    pub registered_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl User {
    /// Build a freshly registered, active account.
    pub fn register(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        roles: RoleSet,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            roles,
            status: UserStatus::Active,
            registered_at: now,
            last_login_at: now,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_active_admin(&self) -> bool {
        self.status == UserStatus::Active && self.is_admin()
    }

    /// Accounts without any role wait for an administrator to assign one.
    pub fn is_pending(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = now;
    }
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .field("status", &self.status)
            .field("registered_at", &self.registered_at)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}
