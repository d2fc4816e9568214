//! # tasknest_api
//!
//! HTTP API library for TaskNest.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use tasknest_core::auth::store::CredentialStore;
use tasknest_core::auth::token::TokenCodec;

use crate::config::ApiConfig;
use crate::handlers::{auth, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential store.
    pub store: Arc<dyn CredentialStore>,
    /// Token codec; stateless, shared across request tasks.
    pub codec: TokenCodec,
    /// API configuration.
    pub config: ApiConfig,
}

/// Run embedded database migrations.
///
/// Delegates to `tasknest_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tasknest_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
///
/// The public sub-router is the allowlist: everything else sits behind
/// the request gate, and admin-only routes behind a further role guard.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler));

    // Admin-only routes
    let admin = Router::new()
        .route("/api/users", get(users::list_users_handler))
        .route_layer(axum::middleware::from_fn(
            middleware::auth::require_admin,
        ));

    // Protected routes (require a valid bearer token)
    let protected = Router::new()
        .route("/api/users/me", get(users::me_handler))
        .route("/api/users/{username}", get(users::get_user_handler))
        .merge(admin)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
