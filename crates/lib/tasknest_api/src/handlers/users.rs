//! User read handlers — the authorization surface over the credential
//! store. Write operations on accounts live elsewhere.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use tasknest_core::models::auth::Role;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserResponse;
use crate::policy::{self, Requirement};

/// `GET /api/users/me` — the caller's own account.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    let record = state
        .store
        .find_by_username(&identity.subject)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(UserResponse::from(&record)))
}

/// `GET /api/users` — all accounts. Admin only (enforced by the
/// `require_admin` route guard).
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.store.list().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// `GET /api/users/{username}` — a single account, visible to its owner
/// and to admins.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
) -> AppResult<Json<UserResponse>> {
    policy::check(
        &Requirement::SelfOrRole(Role::Admin),
        Some(&identity),
        Some(&username),
    )?;

    let record = state
        .store
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(UserResponse::from(&record)))
}
