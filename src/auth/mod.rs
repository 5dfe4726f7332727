pub mod password;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::User;

pub use password::{hash_password, verify_password};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    #[serde(rename = "token_type")]
    pub kind: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, kind: TokenKind) -> Self {
        let security = &config::config().security;
        let lifetime = match kind {
            TokenKind::Access => Duration::minutes(security.access_token_minutes as i64),
            TokenKind::Refresh => Duration::days(security.refresh_token_days as i64),
        };
        Self::with_lifetime(user.id, &user.username, kind, lifetime)
    }

    pub fn with_lifetime(user_id: Uuid, username: &str, kind: TokenKind, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username: username.to_string(),
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Every way a presented token can be rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Refresh token required")]
    Missing,

    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is not an {expected:?} token")]
    WrongKind { expected: TokenKind },

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token could not be issued: {0}")]
    Generation(String),
}

impl TokenError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Missing => "TOKEN_MISSING",
            TokenError::Malformed => "TOKEN_MALFORMED",
            TokenError::InvalidSignature => "TOKEN_INVALID_SIGNATURE",
            TokenError::Expired => "TOKEN_EXPIRED",
            TokenError::WrongKind { .. } => "TOKEN_WRONG_TYPE",
            TokenError::Revoked => "TOKEN_REVOKED",
            TokenError::Generation(_) => "TOKEN_GENERATION_FAILED",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::Generation("JWT secret not configured".to_string()));
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

/// Issue a fresh access + refresh pair for `user`
pub fn issue_token_pair(user: &User) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access: generate_jwt(&Claims::new(user, TokenKind::Access))?,
        refresh: generate_jwt(&Claims::new(user, TokenKind::Refresh))?,
    })
}

/// Verify signature and expiry, then check the token is of the `expected` kind.
/// Revocation is checked separately against the store.
pub fn decode_jwt(token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }

    let secret = &config::config().security.jwt_secret;
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &decoding_key, &validation)?.claims;
    if claims.kind != expected {
        return Err(TokenError::WrongKind { expected });
    }
    Ok(claims)
}
