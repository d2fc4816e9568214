//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse};
use crate::services::auth;

/// `POST /api/auth/login` — authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(
        state.store.as_ref(),
        &state.codec,
        &body.username,
        &body.password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/auth/register` — create a new account. Duplicate usernames
/// answer 409.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let resp = auth::register(
        state.store.as_ref(),
        &state.codec,
        &body.username,
        &body.password,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /api/auth/refresh` — exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh(state.store.as_ref(), &state.codec, &body.refresh_token).await?;
    Ok(Json(resp))
}
