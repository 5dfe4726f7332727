use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;

/// The authenticated user's current row, injected by `validate_user_middleware`
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware that loads the user named by the access token.
/// A token for a user that no longer exists is treated as unauthenticated.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let user = state
        .store
        .find_user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                "User validation failed: user '{}' (ID: {}) no longer exists",
                auth_user.username,
                auth_user.user_id
            );
            ApiError::unauthorized("User not found")
        })?;

    tracing::debug!("User validation successful: {} ({})", user.username, user.id);

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
