//! Credential-store database queries.

use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{CredentialRecord, NewCredential, Role};

type CredentialRow = (i64, String, String, String);

fn from_row((id, username, password_hash, role): CredentialRow) -> Result<CredentialRecord, AuthError> {
    let role: Role = role
        .parse()
        .map_err(|e| AuthError::Internal(format!("corrupt role column: {e}")))?;
    Ok(CredentialRecord {
        id,
        username,
        password_hash,
        role,
    })
}

/// Fetch a credential record by username (exact, case-sensitive match).
pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<CredentialRecord>, AuthError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, username, password_hash, role FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    row.map(from_row).transpose()
}

/// Insert a credential record unless the username is already taken.
///
/// `ON CONFLICT DO NOTHING` makes the unique index the arbiter of
/// concurrent registrations; a lost race returns `None` rather than an
/// error.
pub async fn insert_if_absent(
    pool: &PgPool,
    new: &NewCredential,
) -> Result<Option<CredentialRecord>, AuthError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
         ON CONFLICT (username) DO NOTHING \
         RETURNING id, username, password_hash, role",
    )
    .bind(&new.username)
    .bind(&new.password_hash)
    .bind(new.role.as_str())
    .fetch_optional(pool)
    .await?;
    if row.is_none() {
        tracing::debug!(username = %new.username, "insert skipped, username taken");
    }
    row.map(from_row).transpose()
}

/// List all credential records, oldest first.
pub async fn list(pool: &PgPool) -> Result<Vec<CredentialRecord>, AuthError> {
    let rows = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, username, password_hash, role FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(from_row).collect()
}
