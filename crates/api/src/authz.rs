//! API-side authorization guard for actions.
//!
//! Handlers call this before touching the credential store, so a caller
//! without a required role never reaches the domain service.

use axum::http::StatusCode;
use axum::response::Response;
use tracing::warn;

use custody_auth::{Action, require};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Check that the caller holds at least one role allowed for `action`.
pub fn authorize_action(principal: &PrincipalContext, action: Action) -> Result<(), Response> {
    require(principal.claims(), action).map_err(|e| {
        warn!(user_id = %principal.user_id(), action = %action, "authorization denied");
        json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}
