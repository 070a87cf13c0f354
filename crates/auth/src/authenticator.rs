//! Sign-in, sign-up and per-request token authentication.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use custody_core::{DomainError, DomainResult, UserId};

use crate::password::DUMMY_HASH;
use crate::registration::{RegistrationOutcome, decide_initial_roles};
use crate::store::{StoreError, UniqueField};
use crate::token::{IssuedToken, TokenCodec};
use crate::{AuthError, CredentialStore, PasswordHasher, Role, RoleSet, User, UserClaims, UserStatus};

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub token: IssuedToken,
    pub claims: UserClaims,
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignUp {
    pub user_id: UserId,
    pub outcome: RegistrationOutcome,
}

/// Credentials submitted at sign-up.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl NewAccount<'_> {
    fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        Ok(())
    }
}

/// Orchestrates credential checks and token issuance.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    codec: TokenCodec,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        codec: TokenCodec,
    ) -> Self {
        Self { store, hasher, codec }
    }

    /// Verify a username/password pair and open a session.
    ///
    /// Unknown usernames and wrong passwords fail identically. Suspension is
    /// only reported once the password has been proven.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SignIn, AuthError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            let _ = self.hasher.verify(password, DUMMY_HASH);
            warn!("sign-in rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(user_id = %user.id, "sign-in rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        if user.status == UserStatus::Suspended {
            warn!(user_id = %user.id, "sign-in rejected: account suspended");
            return Err(AuthError::AccountSuspended);
        }

        self.store.record_login(user.id, now).await?;

        // Claims come from the record as it stands after the stamp, not the
        // copy loaded before the password check.
        let Some(user) = self.store.find_by_id(user.id).await? else {
            warn!(user_id = %user.id, "sign-in rejected: account vanished");
            return Err(AuthError::InvalidCredentials);
        };
        if user.status == UserStatus::Suspended {
            warn!(user_id = %user.id, "sign-in rejected: account suspended");
            return Err(AuthError::AccountSuspended);
        }

        let token = self.codec.issue(user.id, now)?;
        info!(user_id = %user.id, username = %user.username, "user signed in");

        Ok(SignIn {
            token,
            claims: UserClaims::from(&user),
        })
    }

    /// Register a new account.
    ///
    /// Uniqueness is checked before anything is written; the store re-checks on
    /// insert so a concurrent duplicate still fails cleanly.
    pub async fn sign_up(
        &self,
        account: NewAccount<'_>,
        now: DateTime<Utc>,
    ) -> Result<SignUp, AuthError> {
        account.validate()?;

        if self.store.exists_by_username(account.username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if self.store.exists_by_email(account.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let is_first_ever_user = self.store.count().await? == 0;
        let initial = decide_initial_roles(is_first_ever_user, account.username);

        let hash = self.hasher.hash(account.password)?;
        let user = User::register(account.username, account.email, hash, initial.roles, now);
        self.insert(&user).await?;

        info!(
            user_id = %user.id,
            username = %user.username,
            administrator = initial.outcome.is_administrator(),
            "user registered"
        );

        Ok(SignUp {
            user_id: user.id,
            outcome: initial.outcome,
        })
    }

    /// Resolve a bearer token to fresh claims.
    ///
    /// Roles and status come from the store, so a suspension or role change
    /// takes effect on the next request rather than at token expiry.
    pub async fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<UserClaims, AuthError> {
        let user_id = self.codec.verify(token, now)?;

        let user = self.store.find_by_id(user_id).await?.ok_or_else(|| {
            warn!(user_id = %user_id, "token subject no longer exists");
            AuthError::InvalidToken
        })?;

        if user.status == UserStatus::Suspended {
            return Err(AuthError::AccountSuspended);
        }

        Ok(UserClaims::from(&user))
    }

    /// Create a configured administrator if, and only if, the store is empty.
    ///
    /// Returns the new account's id, or `None` when accounts already exist.
    pub async fn seed_admin(
        &self,
        account: NewAccount<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, AuthError> {
        account.validate()?;

        if self.store.count().await? > 0 {
            return Ok(None);
        }

        let hash = self.hasher.hash(account.password)?;
        let user = User::register(
            account.username,
            account.email,
            hash,
            RoleSet::from([Role::Admin]),
            now,
        );
        self.insert(&user).await?;

        info!(user_id = %user.id, username = %user.username, "seeded bootstrap administrator");
        Ok(Some(user.id))
    }

    async fn insert(&self, user: &User) -> Result<(), AuthError> {
        self.store.insert(user).await.map_err(|e| match e {
            StoreError::Conflict(UniqueField::Username) => AuthError::UsernameTaken,
            StoreError::Conflict(UniqueField::Email) => AuthError::EmailTaken,
            other => AuthError::Store(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::testing::{PlainHasher, authenticator, counting_store};
    use crate::{InMemoryCredentialStore, UserAdministration};

    /// Admin action to run while a sign-in sits between load and stamp.
    enum Interleave {
        PromoteThenStepDown { acting: UserClaims, promote: UserId },
        Suspend { acting: UserClaims, target: UserId },
    }

    /// Runs an administrator change right after the username lookup returns.
    struct InterleavingStore {
        inner: Arc<InMemoryCredentialStore>,
        admin: UserAdministration,
        pending: Mutex<Option<Interleave>>,
    }

    impl InterleavingStore {
        fn new(inner: Arc<InMemoryCredentialStore>, action: Interleave) -> Self {
            Self {
                admin: UserAdministration::new(inner.clone()),
                inner,
                pending: Mutex::new(Some(action)),
            }
        }
    }

    #[async_trait]
    impl CredentialStore for InterleavingStore {
        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            let snapshot = self.inner.find_by_username(username).await?;
            let action = self.pending.lock().unwrap().take();
            match action {
                Some(Interleave::PromoteThenStepDown { acting, promote }) => {
                    self.admin.update_roles(&acting, promote, ["ROLE_ADMIN"]).await.unwrap();
                    self.admin
                        .update_roles(&acting, acting.id, Vec::<String>::new())
                        .await
                        .unwrap();
                }
                Some(Interleave::Suspend { acting, target }) => {
                    self.admin
                        .update_status(&acting, target, UserStatus::Suspended)
                        .await
                        .unwrap();
                }
                None => {}
            }
            Ok(snapshot)
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
            self.inner.insert(user).await
        }

        async fn save(&self, user: &User) -> Result<(), StoreError> {
            self.inner.save(user).await
        }

        async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
            self.inner.record_login(id, at).await
        }
    }

    /// Plain hasher that counts verifications.
    #[derive(Default)]
    struct CountingHasher {
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> Result<String, AuthError> {
            PlainHasher.hash(password)
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            PlainHasher.verify(password, hash)
        }
    }

    /// Admin "admin" and pending "bob", both signed up through `auth`.
    async fn admin_and_bob(auth: &Authenticator, store: &InMemoryCredentialStore) -> (User, User) {
        let now = Utc::now();
        let root = auth.sign_up(account("admin", "a@x.com"), now).await.unwrap();
        let bob = auth.sign_up(account("bob", "b@x.com"), now).await.unwrap();
        (
            store.find_by_id(root.user_id).await.unwrap().unwrap(),
            store.find_by_id(bob.user_id).await.unwrap().unwrap(),
        )
    }

    fn over(store: InterleavingStore) -> Authenticator {
        Authenticator::new(
            Arc::new(store),
            Arc::new(PlainHasher),
            TokenCodec::new(b"test-secret", Duration::hours(1)),
        )
    }

    fn account<'a>(username: &'a str, email: &'a str) -> NewAccount<'a> {
        NewAccount {
            username,
            email,
            password: "p",
        }
    }

    #[tokio::test]
    async fn first_admin_then_pending_user() {
        let (auth, store) = authenticator();
        let now = Utc::now();

        let first = auth.sign_up(account("admin", "a@x.com"), now).await.unwrap();
        assert_eq!(first.outcome, RegistrationOutcome::AdministratorRegistered);
        let admin = store.find_by_id(first.user_id).await.unwrap().unwrap();
        assert_eq!(admin.roles, RoleSet::from([Role::Admin]));

        let second = auth.sign_up(account("bob", "b@x.com"), now).await.unwrap();
        assert_eq!(second.outcome, RegistrationOutcome::PendingRoleAssignment);
        let bob = store.find_by_id(second.user_id).await.unwrap().unwrap();
        assert!(bob.roles.is_empty());
        assert_eq!(bob.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn admin_name_is_not_special_once_store_has_users() {
        let (auth, store) = authenticator();
        let now = Utc::now();

        auth.sign_up(account("bob", "b@x.com"), now).await.unwrap();
        let late = auth.sign_up(account("admin", "a@x.com"), now).await.unwrap();
        assert_eq!(late.outcome, RegistrationOutcome::PendingRoleAssignment);
        assert!(store.find_by_id(late.user_id).await.unwrap().unwrap().roles.is_empty());
    }

    #[tokio::test]
    async fn duplicate_username_or_email_fails_before_any_write() {
        let store = counting_store();
        let auth = Authenticator::new(
            store.clone(),
            Arc::new(PlainHasher),
            TokenCodec::new(b"k", Duration::hours(1)),
        );
        let now = Utc::now();
        auth.sign_up(account("alice", "a@x.com"), now).await.unwrap();
        let writes = store.inserts();

        assert!(matches!(
            auth.sign_up(account("alice", "new@x.com"), now).await,
            Err(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            auth.sign_up(account("alicia", "a@x.com"), now).await,
            Err(AuthError::EmailTaken)
        ));
        assert_eq!(store.inserts(), writes);
    }

    #[tokio::test]
    async fn malformed_signup_is_rejected() {
        let (auth, _store) = authenticator();
        let err = auth
            .sign_up(account("alice", "not-an-email"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Invalid(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn sign_in_returns_token_and_claims_and_stamps_login() {
        let (auth, store) = authenticator();
        let registered = Utc::now() - Duration::days(1);
        let signup = auth.sign_up(account("admin", "a@x.com"), registered).await.unwrap();

        let now = Utc::now();
        let session = auth.sign_in("admin", "p", now).await.unwrap();

        assert_eq!(session.claims.id, signup.user_id);
        assert_eq!(session.claims.username, "admin");
        assert_eq!(session.claims.role_labels(), vec!["ROLE_ADMIN".to_string()]);
        assert_eq!(session.token.expires_at, now + Duration::hours(1));

        let stored = store.find_by_id(signup.user_id).await.unwrap().unwrap();
        assert_eq!(stored.last_login_at, now);
        assert_eq!(stored.registered_at, registered);

        let claims = auth.authenticate(&session.token.token, now).await.unwrap();
        assert_eq!(claims, session.claims);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let (auth, _store) = authenticator();
        let now = Utc::now();
        auth.sign_up(account("alice", "a@x.com"), now).await.unwrap();

        let unknown = auth.sign_in("mallory", "p", now).await.unwrap_err();
        let wrong = auth.sign_in("alice", "nope", now).await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn suspended_user_cannot_sign_in_or_use_old_token() {
        let (auth, store) = authenticator();
        let now = Utc::now();
        let signup = auth.sign_up(account("alice", "a@x.com"), now).await.unwrap();
        let session = auth.sign_in("alice", "p", now).await.unwrap();

        let mut user = store.find_by_id(signup.user_id).await.unwrap().unwrap();
        user.status = UserStatus::Suspended;
        store.save(&user).await.unwrap();

        assert!(matches!(
            auth.sign_in("alice", "p", now).await,
            Err(AuthError::AccountSuspended)
        ));
        // Wrong password still reads as bad credentials, not as suspension.
        assert!(matches!(
            auth.sign_in("alice", "nope", now).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate(&session.token.token, now).await,
            Err(AuthError::AccountSuspended)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_refused() {
        let (auth, _store) = authenticator();
        let now = Utc::now();
        auth.sign_up(account("alice", "a@x.com"), now).await.unwrap();
        let session = auth.sign_in("alice", "p", now).await.unwrap();

        assert!(matches!(
            auth.authenticate(&session.token.token, now + Duration::hours(2)).await,
            Err(AuthError::ExpiredToken)
        ));
    }

    #[tokio::test]
    async fn token_for_vanished_subject_is_invalid() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let codec = TokenCodec::new(b"k", Duration::hours(1));
        let auth = Authenticator::new(store, Arc::new(PlainHasher), codec.clone());
        let now = Utc::now();

        let stray = codec.issue(UserId::new(), now).unwrap();
        assert!(matches!(
            auth.authenticate(&stray.token, now).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn role_changes_show_up_on_next_request() {
        let (auth, store) = authenticator();
        let now = Utc::now();
        let signup = auth.sign_up(account("bob", "b@x.com"), now).await.unwrap();
        let session = auth.sign_in("bob", "p", now).await.unwrap();
        assert!(session.claims.roles.is_empty());

        let mut bob = store.find_by_id(signup.user_id).await.unwrap().unwrap();
        bob.roles.insert(Role::Medecin);
        store.save(&bob).await.unwrap();

        let claims = auth.authenticate(&session.token.token, now).await.unwrap();
        assert!(claims.has_role(Role::Medecin));
    }

    #[tokio::test]
    async fn seed_admin_only_on_empty_store() {
        let (auth, store) = authenticator();
        let now = Utc::now();

        let seeded = auth
            .seed_admin(account("chief", "chief@x.com"), now)
            .await
            .unwrap()
            .expect("empty store gets seeded");
        assert!(store.find_by_id(seeded).await.unwrap().unwrap().is_admin());

        let again = auth.seed_admin(account("deputy", "d@x.com"), now).await.unwrap();
        assert_eq!(again, None);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sign_in_keeps_role_change_made_while_it_ran() {
        let (auth, store) = authenticator();
        let (root, bob) = admin_and_bob(&auth, &store).await;

        let racing = over(InterleavingStore::new(
            store.clone(),
            Interleave::PromoteThenStepDown {
                acting: UserClaims::from(&root),
                promote: bob.id,
            },
        ));
        let now = Utc::now();
        let session = racing.sign_in("bob", "p", now).await.unwrap();

        assert!(session.claims.has_role(Role::Admin));
        let stored = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert!(stored.is_admin());
        assert_eq!(stored.last_login_at, now);

        let admins = store.list().await.unwrap().iter().filter(|u| u.is_admin()).count();
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn sign_in_refuses_account_suspended_while_it_ran() {
        let (auth, store) = authenticator();
        let (root, bob) = admin_and_bob(&auth, &store).await;

        let racing = over(InterleavingStore::new(
            store.clone(),
            Interleave::Suspend {
                acting: UserClaims::from(&root),
                target: bob.id,
            },
        ));

        assert!(matches!(
            racing.sign_in("bob", "p", Utc::now()).await,
            Err(AuthError::AccountSuspended)
        ));
        let stored = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UserStatus::Suspended);
    }

    #[tokio::test]
    async fn unknown_user_still_costs_one_verification() {
        let hasher = Arc::new(CountingHasher::default());
        let auth = Authenticator::new(
            Arc::new(InMemoryCredentialStore::new()),
            hasher.clone(),
            TokenCodec::new(b"k", Duration::hours(1)),
        );
        let now = Utc::now();
        auth.sign_up(account("alice", "a@x.com"), now).await.unwrap();

        assert!(matches!(
            auth.sign_in("mallory", "p", now).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 1);

        assert!(matches!(
            auth.sign_in("alice", "nope", now).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);
    }
}
