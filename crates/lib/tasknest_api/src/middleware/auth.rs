//! Request gate — Bearer token extraction and validation.
//!
//! Runs once per inbound request on the protected sub-router. Every
//! request performs a fresh signature check; nothing is cached between
//! requests. Rejections log the failure kind and, where known, the
//! subject — never the raw token.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use tasknest_core::auth::token::TokenError;
use tasknest_core::models::auth::Role;

use crate::AppState;
use crate::error::AppError;
use crate::policy::{self, Requirement};

/// Authenticated identity attached to request extensions after a
/// successful gate pass. Scoped to the request; discarded at its end.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub subject: String,
    pub role: Role,
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, validates
/// it, and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let claims = state.codec.validate_access(token).map_err(|e| {
        warn!(kind = %e, "rejected bearer token");
        match e {
            TokenError::Expired => AppError::Unauthorized("Token expired".into()),
            TokenError::BadSignature | TokenError::Malformed => {
                AppError::Unauthorized("Invalid token".into())
            }
        }
    })?;

    debug!(subject = %claims.subject, "request authenticated");
    request.extensions_mut().insert(AuthenticatedUser {
        subject: claims.subject,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Route guard for admin-only endpoints. Layered inside `require_auth`,
/// so a missing identity here still answers 401, not 403.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = request.extensions().get::<AuthenticatedUser>();
    policy::check(&Requirement::Role(Role::Admin), identity, None)?;
    Ok(next.run(request).await)
}
