//! Password hashing seam.
//!
//! The authenticator only sees [`PasswordHasher`]; production uses Argon2id
//! with a per-password random salt.

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};

use crate::AuthError;

/// Well-formed Argon2id hash matching no password. Verified against when the
/// username is unknown so both rejections cost the same.
pub(crate) const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Y3VzdG9keWR1bW15c2FsdA$Iaf2HBXO9N3trgdta3OT8dPUqbXIcN9gygxZsZXvFgI";

/// One-way salted password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plain password into a self-describing (PHC) string.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plain password against a stored hash.
    ///
    /// `Ok(false)` means "wrong password"; `Err` means the hash itself is unusable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }
}
