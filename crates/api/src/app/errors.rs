use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use custody_auth::AuthError;

/// HTTP status for each failure kind.
pub fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::ExpiredToken => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::AccountSuspended => StatusCode::FORBIDDEN,
        AuthError::UsernameTaken
        | AuthError::EmailTaken
        | AuthError::LastAdminRoleRemoval
        | AuthError::LastActiveAdminSuspension
        | AuthError::Invalid(_) => StatusCode::BAD_REQUEST,
        AuthError::NotFound(_) => StatusCode::NOT_FOUND,
        AuthError::UnknownRole(_)
        | AuthError::Hashing(_)
        | AuthError::Signing(_)
        | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(code = err.code(), error = %err, "request failed");
    }
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
