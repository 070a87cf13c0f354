//! Public sign-in and sign-up.

use std::sync::Arc;

use axum::{Extension, Json, response::IntoResponse};
use chrono::Utc;

use custody_auth::NewAccount;

use crate::app::dto::{SigninRequest, SigninResponse, SignupRequest, SignupResponse};
use crate::app::errors::auth_error_to_response;
use crate::app::services::AppServices;

/// POST /api/auth/signin
pub async fn signin(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SigninRequest>,
) -> axum::response::Response {
    match services
        .authenticator
        .sign_in(&body.username, &body.password, Utc::now())
        .await
    {
        Ok(sign_in) => Json(SigninResponse::from(sign_in)).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

/// POST /api/auth/signup
pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SignupRequest>,
) -> axum::response::Response {
    let account = NewAccount {
        username: &body.username,
        email: &body.email,
        password: &body.password,
    };

    match services.authenticator.sign_up(account, Utc::now()).await {
        Ok(sign_up) => Json(SignupResponse::from(sign_up)).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}
