use serde::Serialize;

use crate::{Role, RoleSet};

/// Username that may claim the bootstrap administrator slot.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationOutcome {
    AdministratorRegistered,
    PendingRoleAssignment,
}

impl RegistrationOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            RegistrationOutcome::AdministratorRegistered => "Administrator registered successfully.",
            RegistrationOutcome::PendingRoleAssignment => {
                "User registered successfully, pending role assignment by an administrator."
            }
        }
    }

    pub fn is_administrator(&self) -> bool {
        matches!(self, RegistrationOutcome::AdministratorRegistered)
    }
}

/// Roles granted at sign-up and how to describe the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialRoles {
    pub roles: RoleSet,
    pub outcome: RegistrationOutcome,
}

/// Decide a new account's roles.
///
/// Only the very first account, and only if it is named exactly `admin`,
/// becomes an administrator. Everybody else waits for an administrator.
pub fn decide_initial_roles(is_first_ever_user: bool, username: &str) -> InitialRoles {
    if is_first_ever_user && username == BOOTSTRAP_ADMIN_USERNAME {
        InitialRoles {
            roles: RoleSet::from([Role::Admin]),
            outcome: RegistrationOutcome::AdministratorRegistered,
        }
    } else {
        InitialRoles {
            roles: RoleSet::new(),
            outcome: RegistrationOutcome::PendingRoleAssignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn first_admin_signup_bootstraps() {
        let decision = decide_initial_roles(true, "admin");
        assert_eq!(decision.roles, RoleSet::from([Role::Admin]));
        assert!(decision.outcome.is_administrator());
    }

    #[test]
    fn admin_name_is_case_sensitive() {
        assert!(decide_initial_roles(true, "Admin").roles.is_empty());
        assert!(decide_initial_roles(true, "admin ").roles.is_empty());
    }

    #[test]
    fn admin_name_after_first_user_is_pending() {
        let decision = decide_initial_roles(false, "admin");
        assert!(decision.roles.is_empty());
        assert_eq!(decision.outcome, RegistrationOutcome::PendingRoleAssignment);
    }

    proptest! {
        #[test]
        fn only_first_admin_gets_roles(first in any::<bool>(), name in "[a-zA-Z]{0,8}") {
            let decision = decide_initial_roles(first, &name);
            let bootstrap = first && name == "admin";
            prop_assert_eq!(!decision.roles.is_empty(), bootstrap);
            prop_assert_eq!(decision.outcome.is_administrator(), bootstrap);
        }
    }
}
