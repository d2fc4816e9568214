//! Declarative per-endpoint access requirements.

use tasknest_core::models::auth::Role;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;

/// What an endpoint demands of the caller.
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    /// Always allowed, identity or not.
    Public,
    /// Caller must hold exactly this role.
    Role(Role),
    /// Caller must hold one of these roles.
    AnyRole(&'static [Role]),
    /// Caller must be the resource owner, or hold this role.
    SelfOrRole(Role),
}

/// Evaluate a requirement against the request's identity.
///
/// A missing identity yields 401 (re-authenticate); a present but
/// insufficient identity yields 403 (lacks permission).
pub fn check(
    requirement: &Requirement,
    identity: Option<&AuthenticatedUser>,
    resource_owner: Option<&str>,
) -> Result<(), AppError> {
    if matches!(requirement, Requirement::Public) {
        return Ok(());
    }
    let identity =
        identity.ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    let allowed = match requirement {
        Requirement::Public => true,
        Requirement::Role(role) => identity.role == *role,
        Requirement::AnyRole(roles) => roles.contains(&identity.role),
        Requirement::SelfOrRole(role) => {
            identity.role == *role || resource_owner == Some(identity.subject.as_str())
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have the required permissions".into(),
        ))
    }
}
