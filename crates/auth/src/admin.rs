//! Administrative account management (roles, status, listings).
//!
//! Callers are expected to have gated the request on [`crate::Action::ManageUsers`];
//! this module enforces the last-administrator invariants.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use custody_core::UserId;

use crate::guard::{guard_role_change, guard_status_change};
use crate::roles::parse_role_labels;
use crate::{AuthError, CredentialStore, User, UserClaims, UserStatus, UserSummary};

/// Role and status mutations plus read-only listings.
///
/// Every mutation runs load → guard → save under one process-wide lock, so
/// two administrators demoting themselves at the same time cannot both pass
/// the "another admin exists" check.
#[derive(Clone)]
pub struct UserAdministration {
    store: Arc<dyn CredentialStore>,
    write_lock: Arc<Mutex<()>>,
}

impl UserAdministration {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Every account, oldest first. `pending_only` keeps accounts with no role.
    pub async fn list_users(&self, pending_only: bool) -> Result<Vec<UserSummary>, AuthError> {
        let users = self.store.list().await?;
        Ok(users
            .iter()
            .filter(|u| !pending_only || u.is_pending())
            .map(UserSummary::from)
            .collect())
    }

    /// Usernames with a live session.
    ///
    /// Sessions are stateless tokens, so nothing is tracked and this is always empty.
    pub async fn active_users(&self) -> Vec<String> {
        Vec::new()
    }

    /// Replace a user's whole role set.
    ///
    /// Unknown labels reject the request before anything is written.
    pub async fn update_roles<I>(
        &self,
        acting: &UserClaims,
        target: UserId,
        labels: I,
    ) -> Result<UserSummary, AuthError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let _guard = self.write_lock.lock().await;

        let mut user = self.load(target).await?;
        let new_roles = parse_role_labels(labels)?;

        let acting = current_claims(acting, &user);
        guard_role_change(&*self.store, &acting, target, &new_roles).await?;

        user.roles = new_roles;
        self.store.save(&user).await?;

        info!(
            actor = %acting.id,
            user_id = %user.id,
            roles = ?user.roles,
            "user roles updated"
        );
        Ok(UserSummary::from(&user))
    }

    /// Set a user's account status.
    pub async fn update_status(
        &self,
        acting: &UserClaims,
        target: UserId,
        status: UserStatus,
    ) -> Result<UserSummary, AuthError> {
        let _guard = self.write_lock.lock().await;

        let mut user = self.load(target).await?;

        let acting = current_claims(acting, &user);
        guard_status_change(&*self.store, &acting, target, status).await?;

        user.status = status;
        self.store.save(&user).await?;

        info!(actor = %acting.id, user_id = %user.id, status = %status, "user status updated");
        Ok(UserSummary::from(&user))
    }

    async fn load(&self, id: UserId) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::NotFound(id))
    }
}

/// When acting on oneself, judge by the stored record rather than the request's claims.
fn current_claims(acting: &UserClaims, target: &User) -> UserClaims {
    if acting.id == target.id {
        UserClaims::from(target)
    } else {
        acting.clone()
    }
}
