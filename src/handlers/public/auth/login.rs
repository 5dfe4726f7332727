use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::auth::{issue_token_pair, verify_password};
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub refresh: String,
    pub access: String,
    pub user: UserProfile,
}

/// POST /api/auth/login - Exchange credentials for an access + refresh token pair
///
/// Expected Output (Success):
/// ```json
/// {
///   "refresh": "eyJhbGciOiJIUzI1NiI...",
///   "access": "eyJhbGciOiJIUzI1NiI...",
///   "user": { "id": "...", "username": "ada", "email": "...", "first_name": "...",
///             "last_name": "...", "reward": 0, "profile_picture": null }
/// }
/// ```
///
/// Missing fields are a 400; wrong credentials are a 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let rejected = || ApiError::unauthorized("No active account found with the given credentials");

    let Some(user) = state.store.find_user_by_username(&username).await? else {
        tracing::warn!(username = %username, "Login failed: unknown username");
        return Err(rejected());
    };

    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
    if !verified {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(rejected());
    }

    let tokens = issue_token_pair(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::success(LoginResponse {
        refresh: tokens.refresh,
        access: tokens.access,
        user: UserProfile::from(&user),
    }))
}
