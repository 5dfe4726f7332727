use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::auth::{decode_jwt, generate_jwt, Claims, TokenError, TokenKind};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// POST /api/auth/token/refresh - Mint a new access token from a refresh token
///
/// Revoked, expired, malformed or access-typed tokens are rejected with 401
/// and a `TOKEN_*` code naming the reason.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> ApiResult<RefreshResponse> {
    let raw = payload
        .refresh
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::token_bad_request(TokenError::Missing))?;

    let claims = decode_jwt(&raw, TokenKind::Refresh)?;

    if state.store.is_token_revoked(claims.jti).await? {
        tracing::warn!(user_id = %claims.sub, jti = %claims.jti, "Refresh attempted with revoked token");
        return Err(TokenError::Revoked.into());
    }

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let access = generate_jwt(&Claims::new(&user, TokenKind::Access))?;
    tracing::debug!(user_id = %user.id, "Access token refreshed");

    Ok(ApiResponse::success(RefreshResponse { access }))
}
