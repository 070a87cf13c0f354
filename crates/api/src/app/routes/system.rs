use axum::{Extension, Json, http::StatusCode};

use crate::app::dto::ClaimsResponse;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/auth/me - the caller's current claims
pub async fn me(Extension(principal): Extension<PrincipalContext>) -> Json<ClaimsResponse> {
    Json(ClaimsResponse::from(principal.claims()))
}
