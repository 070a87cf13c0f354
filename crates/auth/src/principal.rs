use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use custody_core::UserId;

use crate::{Role, RoleSet, User, UserStatus};

/// Materialized facts about an authenticated user.
///
/// Built from the credential store after a token or password has been
/// verified, then passed explicitly to every authorization and guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: RoleSet,
    pub status: UserStatus,
}

impl UserClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn role_labels(&self) -> Vec<String> {
        crate::roles::role_labels(&self.roles)
    }
}

impl From<&User> for UserClaims {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            status: user.status,
        }
    }
}

/// Public view of an account for administrative listings.
///
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: RoleSet,
    pub status: UserStatus,
    pub registered_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            status: user.status,
            registered_at: user.registered_at,
            last_login_at: user.last_login_at,
        }
    }
}
