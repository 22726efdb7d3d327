use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

/// Tokens are valid for eight hours from issue.
pub const TOKEN_TTL_HOURS: i64 = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Canonical encoding: the base-10 string of the integer user id.
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
}

/// A decoded, signature-checked assertion with the subject normalized back
/// to the integer user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

/// Issues and verifies HS256 bearer tokens. Constructed once from config
/// and carried in application state; handlers never touch the secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(&self, user_id: i32, username: &str, role: Role) -> anyhow::Result<String> {
        self.issue_with_ttl(user_id, username, role, Duration::hours(TOKEN_TTL_HOURS))
    }

    pub fn issue_with_ttl(
        &self,
        user_id: i32,
        username: &str,
        role: Role,
        ttl: Duration,
    ) -> anyhow::Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow::anyhow!("failed to compute token expiry"))?;

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            exp: expiration.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        // Normalize the subject; a token carrying anything but a decimal
        // integer id is malformed no matter who signed it.
        let user_id = decoded
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| TokenError::Invalid)?;

        Ok(VerifiedToken {
            user_id,
            username: decoded.claims.username,
            role: decoded.claims.role,
        })
    }
}
