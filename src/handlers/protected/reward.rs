use axum::{extract::State, Extension};
use serde::Serialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Serialize)]
pub struct RewardResponse {
    pub points: i32,
}

/// GET /api/reward - Current reward balance
pub async fn reward_get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<RewardResponse> {
    let points = state.store.reward_points(user.id).await?;
    Ok(ApiResponse::success(RewardResponse { points }))
}
