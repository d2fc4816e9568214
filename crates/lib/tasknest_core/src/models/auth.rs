//! Authentication domain models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role. Closed set; unknown values are rejected at every boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Canonical string form, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    /// Claim form carried inside tokens (`ROLE_ADMIN` / `ROLE_USER`).
    pub fn to_claim(self) -> String {
        format!("ROLE_{}", self.as_str())
    }

    /// Parse the prefixed claim form back into a role.
    pub fn from_claim(claim: &str) -> Option<Role> {
        claim.strip_prefix("ROLE_").and_then(|s| s.parse().ok())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for role strings outside the closed set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// Credential record as held by the credential store.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// New credential record, prior to insertion.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// JWT claims on the wire.
///
/// Access tokens carry `role` in its prefixed claim form; refresh tokens
/// carry no role claim at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — username (standard JWT `sub` claim).
    pub sub: String,
    /// Prefixed role claim (e.g. `ROLE_USER`), absent on refresh tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued at (unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (unix timestamp, seconds).
    pub exp: i64,
}

/// Validated access-token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: String,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}
