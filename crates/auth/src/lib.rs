//! `custody-auth`: authentication and role-management core.
//!
//! Token issuance, authorization decisions and the last-administrator
//! invariants. Decoupled from HTTP; storage is reached only through
//! [`CredentialStore`].

pub mod admin;
pub mod authenticator;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod guard;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod registration;
pub mod roles;
pub mod store;
pub mod token;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::UserAdministration;
pub use authenticator::{Authenticator, NewAccount, SignIn, SignUp};
pub use authorize::{AuthzError, authorize, require};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use password::{Argon2Hasher, PasswordHasher};
pub use permissions::Action;
pub use principal::{UserClaims, UserSummary};
pub use registration::{InitialRoles, RegistrationOutcome, decide_initial_roles};
pub use roles::{Role, RoleSet, parse_role_labels, role_labels};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError, UniqueField};
pub use token::{IssuedToken, TokenCodec};
pub use user::{User, UserStatus};
