use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// A blacklisted refresh token. Only the `jti` and a SHA-256 fingerprint are kept.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub fingerprint: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}

impl RevokedToken {
    pub fn new(jti: Uuid, user_id: Uuid, raw_token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            jti,
            user_id,
            fingerprint: fingerprint(raw_token),
            expires_at,
            revoked_at: Utc::now(),
        }
    }
}

pub fn fingerprint(raw_token: &str) -> String {
    format!("{:x}", Sha256::digest(raw_token.as_bytes()))
}
