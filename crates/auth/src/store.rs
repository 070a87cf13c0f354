//! Credential store abstraction and the in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use custody_core::UserId;

use crate::User;

/// Field whose uniqueness an insert violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Conflict(UniqueField),

    #[error("user {0} does not exist")]
    Missing(UserId),

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Persistence for user accounts.
///
/// Implementations must make `insert` fail with [`StoreError::Conflict`] when
/// the username or email already exists, even under concurrent inserts.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn insert(&self, user: &User) -> Result<(), StoreError>;
    /// Overwrite an existing account.
    async fn save(&self, user: &User) -> Result<(), StoreError>;
    /// Stamp a successful sign-in. Touches `last_login_at` only, so a
    /// concurrent role or status change is never overwritten.
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        (**self).find_by_username(username).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        (**self).exists_by_username(username).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        (**self).exists_by_email(email).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        (**self).count().await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        (**self).list().await
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        (**self).insert(user).await
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        (**self).save(user).await
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).record_login(id, at).await
    }
}

/// In-memory credential store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<UserId, User>>, StoreError> {
        self.users
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<UserId, User>>, StoreError> {
        self.users
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.values().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.values().any(|u| u.email == email))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.len() as u64)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.read()?.values().cloned().collect();
        users.sort_by_key(|u| (u.registered_at, u.id));
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        // Uniqueness check and insert happen under one write lock.
        let mut users = self.write()?;
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.write()?;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(user.id)),
        }
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.write()?;
        let user = users.get_mut(&id).ok_or(StoreError::Missing(id))?;
        user.record_login(at);
        Ok(())
    }
}
