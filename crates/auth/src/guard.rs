//! Last-administrator guards.
//!
//! There is no out-of-band recovery path, so the store must never end up
//! without an administrator who can sign in. Two self-service mutations can
//! cause that, and both are vetoed here before anything is persisted:
//!
//! - an administrator dropping their own `ADMIN` role while no other account
//!   holds it (suspended administrators count), and
//! - an administrator suspending themselves while no other *active*
//!   administrator exists.
//!
//! The count is read and then acted upon, so callers must serialize admin
//! mutations (see [`crate::UserAdministration`]) for the check to hold under
//! concurrency.

use tracing::warn;

use custody_core::UserId;

use crate::{AuthError, CredentialStore, Role, RoleSet, User, UserClaims, UserStatus};

/// Whether a role change is an administrator removing their own `ADMIN` role.
pub fn is_self_admin_removal(acting: &UserClaims, target: UserId, new_roles: &RoleSet) -> bool {
    acting.id == target && acting.is_admin() && !new_roles.contains(&Role::Admin)
}

/// Whether a status change is a user suspending themselves.
pub fn is_self_suspension(acting: &UserClaims, target: UserId, new_status: UserStatus) -> bool {
    acting.id == target && new_status == UserStatus::Suspended
}

/// Accounts holding `ADMIN`, whatever their status.
pub fn count_admins(users: &[User]) -> usize {
    users.iter().filter(|u| u.is_admin()).count()
}

/// Accounts that are both `ACTIVE` and hold `ADMIN`.
pub fn count_active_admins(users: &[User]) -> usize {
    users.iter().filter(|u| u.is_active_admin()).count()
}

/// Veto a role change that would remove the last administrator.
pub fn check_role_change(
    acting: &UserClaims,
    target: UserId,
    new_roles: &RoleSet,
    users: &[User],
) -> Result<(), AuthError> {
    if is_self_admin_removal(acting, target, new_roles) && count_admins(users) <= 1 {
        warn!(user_id = %acting.id, "vetoed removal of the last ADMIN role");
        return Err(AuthError::LastAdminRoleRemoval);
    }
    Ok(())
}

/// Veto a status change that would suspend the last active administrator.
pub fn check_status_change(
    acting: &UserClaims,
    target: UserId,
    new_status: UserStatus,
    users: &[User],
) -> Result<(), AuthError> {
    if is_self_suspension(acting, target, new_status) && count_active_admins(users) <= 1 {
        warn!(user_id = %acting.id, "vetoed suspension of the last active administrator");
        return Err(AuthError::LastActiveAdminSuspension);
    }
    Ok(())
}

/// [`check_role_change`] against the live store.
///
/// The store is only listed when the change is a self-removal of `ADMIN`.
pub async fn guard_role_change<S>(
    store: &S,
    acting: &UserClaims,
    target: UserId,
    new_roles: &RoleSet,
) -> Result<(), AuthError>
where
    S: CredentialStore + ?Sized,
{
    if !is_self_admin_removal(acting, target, new_roles) {
        return Ok(());
    }
    let users = store.list().await?;
    check_role_change(acting, target, new_roles, &users)
}

/// [`check_status_change`] against the live store.
pub async fn guard_status_change<S>(
    store: &S,
    acting: &UserClaims,
    target: UserId,
    new_status: UserStatus,
) -> Result<(), AuthError>
where
    S: CredentialStore + ?Sized,
{
    if !is_self_suspension(acting, target, new_status) {
        return Ok(());
    }
    let users = store.list().await?;
    check_status_change(acting, target, new_status, &users)
}
