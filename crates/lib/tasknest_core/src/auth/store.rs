//! Credential store boundary.
//!
//! The authentication flows only ever need lookup-by-username and a
//! uniqueness-guarded insert; everything else about persistence stays
//! behind this trait.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{AuthError, queries};
use crate::models::auth::{CredentialRecord, NewCredential};

/// Storage for credential records. Implementations must guarantee
/// at-most-one record per username; `insert_if_absent` relies on that
/// guarantee as the sole serialization point for concurrent registration.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive lookup.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<CredentialRecord>, AuthError>;

    /// Insert unless the username exists. Returns `None` when it does,
    /// including when a concurrent insert won the race.
    async fn insert_if_absent(
        &self,
        new: NewCredential,
    ) -> Result<Option<CredentialRecord>, AuthError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError>;
}

/// PostgreSQL-backed credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        queries::find_by_username(&self.pool, username).await
    }

    async fn insert_if_absent(
        &self,
        new: NewCredential,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        queries::insert_if_absent(&self.pool, &new).await
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        queries::list(&self.pool).await
    }
}
