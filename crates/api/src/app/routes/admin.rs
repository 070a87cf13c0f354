//! Administrator-only account management.
//!
//! Every handler checks [`Action::ManageUsers`] before calling the service;
//! the last-administrator invariants are enforced by the service itself.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use custody_auth::{Action, UserStatus};
use custody_core::UserId;

use crate::app::dto::{
    ListUsersQuery, MessageResponse, RoleUpdateRequest, StatusQuery, UserSummaryResponse,
};
use crate::app::errors::{auth_error_to_response, json_error};
use crate::app::services::AppServices;
use crate::authz::authorize_action;
use crate::context::PrincipalContext;

/// GET /api/admin/users[?pending=true]
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ListUsersQuery>,
) -> axum::response::Response {
    if let Err(resp) = authorize_action(&principal, Action::ManageUsers) {
        return resp;
    }

    match services.admin.list_users(query.pending).await {
        Ok(users) => Json(
            users
                .into_iter()
                .map(UserSummaryResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

/// GET /api/admin/active-users
pub async fn active_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authorize_action(&principal, Action::ManageUsers) {
        return resp;
    }

    Json(services.admin.active_users().await).into_response()
}

/// PUT /api/admin/users/:id/roles
pub async fn update_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<RoleUpdateRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize_action(&principal, Action::ManageUsers) {
        return resp;
    }

    let target = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .admin
        .update_roles(principal.claims(), target, &body.roles)
        .await
    {
        Ok(_) => Json(MessageResponse::new("User roles updated successfully.")).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

/// PUT /api/admin/users/:id/status?status=ACTIVE|SUSPENDED
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> axum::response::Response {
    if let Err(resp) = authorize_action(&principal, Action::ManageUsers) {
        return resp;
    }

    let target = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let status: UserStatus = match query.status.parse() {
        Ok(v) => v,
        Err(e) => {
            return json_error(StatusCode::BAD_REQUEST, "validation_error", format!("{e}"));
        }
    };

    match services
        .admin
        .update_status(principal.claims(), target, status)
        .await
    {
        Ok(_) => Json(MessageResponse::new("User status updated successfully.")).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"))
}
