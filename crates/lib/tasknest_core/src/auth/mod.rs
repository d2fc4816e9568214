//! Authentication and authorization logic.
//!
//! Provides the token codec, password hashing, and the credential-store
//! boundary shared by the API layer and the server binary.

pub mod password;
pub mod queries;
pub mod store;
pub mod token;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad username or password. Deliberately carries no detail: the
    /// wrong-password and no-such-user cases must be indistinguishable.
    #[error("Invalid credentials")]
    CredentialError,

    #[error(transparent)]
    Token(#[from] token::TokenError),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
