//! JWT session tokens
//!
//! Tokens are HS256-signed, carry the user's identity and role, and expire a
//! fixed time after issuance (one hour by default). There is no refresh
//! flow: an expired session requires a fresh login.
//!
//! # Claims
//!
//! - `id`: user id
//! - `name`: username
//! - `email`
//! - `role`
//! - `time`: issuance instant, milliseconds since the epoch
//! - `iss`, `iat`, `nbf`, `exp`: standard registered claims
//!
//! # Example
//!
//! ```
//! use taskflow_shared::auth::jwt::{create_token, validate_token, Claims};
//! use taskflow_shared::models::user::Role;
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let user_id = Uuid::new_v4();
//! let claims = Claims::new(user_id, "ana", "ana@example.com", Role::Manager);
//! let token = create_token(&claims, "a-secret-key-that-is-long-enough!")?;
//!
//! let validated = validate_token(&token, "a-secret-key-that-is-long-enough!")?;
//! assert_eq!(validated.id, user_id);
//! assert_eq!(validated.role, Role::Manager);
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{Role, User};

/// Issuer written into and required from every token
pub const ISSUER: &str = "taskflow";

/// Session lifetime when none is configured
pub const DEFAULT_SESSION_MINUTES: i64 = 60;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: Uuid,

    /// Username at issuance
    pub name: String,

    pub email: String,

    pub role: Role,

    /// Issuance instant in milliseconds
    pub time: i64,

    pub iss: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,
}

impl Claims {
    /// Claims with the default one-hour lifetime
    pub fn new(id: Uuid, name: &str, email: &str, role: Role) -> Self {
        Self::with_expiration(id, name, email, role, Duration::minutes(DEFAULT_SESSION_MINUTES))
    }

    pub fn with_expiration(
        id: Uuid,
        name: &str,
        email: &str,
        role: Role,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            time: now.timestamp_millis(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Claims for `user` valid for `expires_in`
    pub fn for_user(user: &User, expires_in: Duration) -> Self {
        Self::with_expiration(user.id, &user.username, &user.email, user.role, expires_in)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs `claims` with HS256.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `nbf` and `exp`, and returns the claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Issues a session token for `user`
pub fn issue_session_token(
    user: &User,
    secret: &str,
    expires_in: Duration,
) -> Result<String, JwtError> {
    create_token(&Claims::for_user(user, expires_in), secret)
}
