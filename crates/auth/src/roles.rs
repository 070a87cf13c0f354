use std::collections::BTreeSet;

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Staff role used for RBAC.
///
/// The set is closed: labels that do not name one of these variants are
/// rejected where they enter the system.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_MEDECIN")]
    Medecin,
    #[serde(rename = "ROLE_PERSONNEL")]
    Personnel,
}

/// Unordered, duplicate-free set of roles held by one user.
pub type RoleSet = BTreeSet<Role>;

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Medecin, Role::Personnel];

    /// Wire label, e.g. `ROLE_ADMIN`.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Medecin => "ROLE_MEDECIN",
            Role::Personnel => "ROLE_PERSONNEL",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    /// Accepts the wire label (`ROLE_ADMIN`) or the bare name (`ADMIN`).
    /// Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("ROLE_").unwrap_or(s) {
            "ADMIN" => Ok(Role::Admin),
            "MEDECIN" => Ok(Role::Medecin),
            "PERSONNEL" => Ok(Role::Personnel),
            _ => Err(AuthError::UnknownRole(s.to_string())),
        }
    }
}

/// Parse a whole batch of role labels.
///
/// Fails on the first unknown label so callers never apply a partial set.
pub fn parse_role_labels<I, S>(labels: I) -> Result<RoleSet, AuthError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels.into_iter().map(|l| l.as_ref().parse()).collect()
}

/// Wire labels for a role set, in `Role` order. Inverse of [`parse_role_labels`].
pub fn role_labels(roles: &RoleSet) -> Vec<String> {
    roles.iter().map(|r| r.label().to_string()).collect()
}
