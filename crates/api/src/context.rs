use custody_auth::UserClaims;
use custody_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted by the bearer middleware from freshly loaded claims; handlers
/// receive it as an extension and never read a global session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    claims: UserClaims,
}

impl PrincipalContext {
    pub fn new(claims: UserClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> UserId {
        self.claims.id
    }

    pub fn claims(&self) -> &UserClaims {
        &self.claims
    }
}
