//! Authentication service — login, registration, token refresh.

use tracing::{info, warn};

use tasknest_core::auth::password::{hash_password, verify_password};
use tasknest_core::auth::store::CredentialStore;
use tasknest_core::auth::token::TokenCodec;
use tasknest_core::models::auth::{CredentialRecord, NewCredential, Role};

use crate::error::{AppError, AppResult};
use crate::models::TokenResponse;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_CHARS: usize = 8;

fn build_token_response(
    codec: &TokenCodec,
    record: &CredentialRecord,
) -> AppResult<TokenResponse> {
    let token = codec.mint_access(&record.username, record.role)?;
    let refresh_token = codec.mint_refresh(&record.username)?;
    Ok(TokenResponse {
        token,
        refresh_token,
        role: record.role,
        username: record.username.clone(),
        user_id: record.id,
    })
}

/// Authenticate with username + password and mint a token pair.
///
/// An unknown username and a wrong password take the same path out: the
/// caller learns `Invalid credentials` and nothing else.
pub async fn login(
    store: &dyn CredentialStore,
    codec: &TokenCodec,
    username: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let record = match store.find_by_username(username).await? {
        Some(record) => record,
        None => {
            warn!(username, "login failed");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(password, &record.password_hash)? {
        warn!(username, "login failed");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(username, role = %record.role, "login succeeded");
    build_token_response(codec, &record)
}

/// Register a new account with role USER, at most once per username.
///
/// Concurrent registrations for the same username are settled by the
/// store's uniqueness guarantee; the losers see the same 409 as a plain
/// duplicate.
pub async fn register(
    store: &dyn CredentialStore,
    codec: &TokenCodec,
    username: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let new = NewCredential {
        username: username.to_string(),
        password_hash: hash_password(password)?,
        role: Role::User,
    };

    let record = store
        .insert_if_absent(new)
        .await?
        .ok_or_else(|| AppError::Conflict("Username already taken".into()))?;

    info!(username, "account registered");
    build_token_response(codec, &record)
}

/// Exchange a refresh token for a fresh token pair.
///
/// The account is re-read so the new access token carries the current
/// role, not the role at refresh-token issuance.
pub async fn refresh(
    store: &dyn CredentialStore,
    codec: &TokenCodec,
    refresh_token: &str,
) -> AppResult<TokenResponse> {
    let subject = codec.validate_refresh(refresh_token).map_err(|e| {
        warn!(kind = %e, "refresh rejected");
        AppError::from(tasknest_core::auth::AuthError::Token(e))
    })?;

    let record = store
        .find_by_username(&subject)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    info!(username = %record.username, "token refreshed");
    build_token_response(codec, &record)
}
