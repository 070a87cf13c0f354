//! Session token codec (HS256 JWT).
//!
//! The signing key is the most sensitive secret in the system: anyone holding
//! it can mint a token for any account.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};

use custody_core::UserId;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};
use crate::AuthError;

/// A freshly minted token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies stateless session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Mint a token for `subject`, valid until `now + ttl`.
    pub fn issue(&self, subject: UserId, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("token lifetime overflows the calendar".into()))?;
        let claims = TokenClaims {
            sub: subject,
            issued_at: now,
            expires_at,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        debug!(user_id = %subject, "issued session token");
        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    /// Verify signature and lifetime, returning the subject.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        // Lifetime is checked against the caller's clock below, not the library's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!(error = %e, "session token rejected");
            AuthError::InvalidToken
        })?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            TokenValidationError::Expired => AuthError::ExpiredToken,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                AuthError::InvalidToken
            }
        })?;

        Ok(data.claims.sub)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
