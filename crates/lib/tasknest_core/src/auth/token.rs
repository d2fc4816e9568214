//! Token codec — JWT minting and validation.
//!
//! The codec is the sole holder of the signing secret. It is constructed
//! once from immutable configuration and is safe to share across request
//! tasks; minting and validation are pure in-memory computation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use super::AuthError;
use crate::models::auth::{Claims, Role, TokenClaims};

/// Minimum secret length for HS256: 256 bits.
const MIN_SECRET_BYTES: usize = 32;

/// Token validation failures. Each maps to a 401 upstream but carries
/// distinct detail for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature does not verify under the current secret.
    #[error("bad signature")]
    BadSignature,

    /// Expiry is not strictly in the future.
    #[error("token expired")]
    Expired,

    /// Structurally invalid: undecodable segments, missing or empty
    /// subject, or a role claim outside the closed set.
    #[error("malformed token")]
    Malformed,
}

/// Fatal configuration errors. The process must refuse to serve traffic
/// rather than swallow these per-request.
#[derive(Debug, Error)]
pub enum SecretKeyError {
    #[error("JWT secret is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("JWT secret too short: {0} bytes, need at least {MIN_SECRET_BYTES}")]
    TooShort(usize),
}

/// Mints and validates signed tokens (HS256).
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Build a codec from a base64-encoded secret and TTLs in milliseconds.
    ///
    /// Rejects secrets that fail to decode or carry fewer than 256 bits of
    /// key material. Rotating the secret invalidates every outstanding
    /// token; that is the only revocation mechanism.
    pub fn new(
        secret_b64: &str,
        access_ttl_ms: i64,
        refresh_ttl_ms: i64,
    ) -> Result<Self, SecretKeyError> {
        let secret = BASE64.decode(secret_b64)?;
        if secret.len() < MIN_SECRET_BYTES {
            return Err(SecretKeyError::TooShort(secret.len()));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            access_ttl: Duration::milliseconds(access_ttl_ms),
            refresh_ttl: Duration::milliseconds(refresh_ttl_ms),
        })
    }

    /// Mint a signed access token for `subject` with a prefixed role claim.
    pub fn mint_access(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        self.mint(subject, Some(role), self.access_ttl)
    }

    /// Mint a longer-lived refresh token. Refresh tokens carry no role
    /// claim, which is what distinguishes them from access tokens.
    pub fn mint_refresh(&self, subject: &str) -> Result<String, AuthError> {
        self.mint(subject, None, self.refresh_ttl)
    }

    fn mint(&self, subject: &str, role: Option<Role>, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            role: role.map(Role::to_claim),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Validate an access token: signature, strict expiry, claim shape.
    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }
        let role = claims
            .role
            .as_deref()
            .and_then(Role::from_claim)
            .ok_or(TokenError::Malformed)?;
        Ok(Claims {
            subject: claims.sub,
            role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// Validate a refresh token, returning the subject. A present role
    /// claim means the caller handed us an access token instead.
    pub fn validate_refresh(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.verify(token)?;
        if claims.sub.is_empty() || claims.role.is_some() {
            return Err(TokenError::Malformed);
        }
        Ok(claims.sub)
    }

    /// Signature check and strict expiry, shared by both token kinds.
    ///
    /// `jsonwebtoken` verifies the HMAC in constant time before any claim
    /// is decoded. Expiry is checked here rather than by the library so
    /// that `exp <= now` is expired, with zero leeway.
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
