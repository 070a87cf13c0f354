//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use custody_core::UserId;

use crate::store::StoreError;
use crate::token::TokenCodec;
use crate::{AuthError, Authenticator, CredentialStore, InMemoryCredentialStore, PasswordHasher, User};

/// Reversible "hash" so tests do not pay for Argon2.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }
}

pub fn authenticator() -> (Authenticator, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let auth = Authenticator::new(
        store.clone(),
        Arc::new(PlainHasher),
        TokenCodec::new(b"test-secret", Duration::hours(1)),
    );
    (auth, store)
}

/// In-memory store that counts writes. Login stamps are not counted as saves.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryCredentialStore,
    inserts: AtomicUsize,
    saves: AtomicUsize,
}

impl CountingStore {
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

pub fn counting_store() -> Arc<CountingStore> {
    Arc::new(CountingStore::default())
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_by_username(username).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        self.inner.exists_by_username(username).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        self.inner.exists_by_email(email).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.inner.count().await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.inner.list().await
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(user).await
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(user).await
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.record_login(id, at).await
    }
}
