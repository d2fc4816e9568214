//! API request and response bodies.

use serde::{Deserialize, Serialize};

use tasknest_core::models::auth::{CredentialRecord, Role};

/// `POST /api/auth/login` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/register` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/refresh` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful login/register/refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
    pub role: Role,
    pub username: String,
    pub user_id: i64,
}

/// Public view of an account. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&CredentialRecord> for UserResponse {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            user_id: record.id,
            username: record.username.clone(),
            role: record.role,
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
