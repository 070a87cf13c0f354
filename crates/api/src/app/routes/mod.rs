use axum::{
    Router,
    routing::{get, post, put},
};

pub mod admin;
pub mod auth;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/signup", post(auth::signup))
}

/// Endpoints behind the bearer middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/api/auth/me", get(system::me))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/active-users", get(admin::active_users))
        .route("/api/admin/users/:id/roles", put(admin::update_roles))
        .route("/api/admin/users/:id/status", put(admin::update_status))
}
