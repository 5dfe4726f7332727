use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::app::AppState;
use crate::auth::{decode_jwt, TokenError, TokenKind};
use crate::database::models::RevokedToken;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct LogoutRequest {
    pub refresh: Option<String>,
}

/// POST /api/auth/logout - Revoke a refresh token
///
/// Expected Input:
/// ```json
/// { "refresh": "eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// A missing, malformed, expired, access-typed or already revoked token is a
/// 400 with the matching `TOKEN_*` code. A body that is absent or not JSON
/// carries no token, so it is `TOKEN_MISSING` too. A refresh token that
/// belongs to another user is a 403 and is left untouched.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<ValidatedJson<LogoutRequest>, ApiError>,
) -> ApiResult<Value> {
    let raw = body
        .ok()
        .and_then(|ValidatedJson(payload)| payload.refresh)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::token_bad_request(TokenError::Missing))?;

    let claims = decode_jwt(&raw, TokenKind::Refresh).map_err(|e| match e {
        TokenError::Generation(_) => ApiError::from(e),
        other => ApiError::token_bad_request(other),
    })?;

    if claims.sub != auth_user.user_id {
        tracing::warn!(
            user_id = %auth_user.user_id,
            token_owner = %claims.sub,
            "Logout attempted with another user's refresh token"
        );
        return Err(ApiError::forbidden("Token does not belong to the authenticated user"));
    }

    let record = RevokedToken::new(claims.jti, claims.sub, &raw, claims.expires_at());
    if !state.store.revoke_token(record).await? {
        return Err(ApiError::token_bad_request(TokenError::Revoked));
    }

    tracing::info!(user_id = %auth_user.user_id, jti = %claims.jti, "Refresh token revoked");

    Ok(ApiResponse::success(json!({ "message": "Logged out successfully" })))
}
