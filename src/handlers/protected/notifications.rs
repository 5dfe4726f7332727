use axum::{extract::State, Extension};
use chrono::Utc;

use crate::app::AppState;
use crate::database::models::Notification;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/notifications - Due-date reminders across the caller's projects
///
/// Computed on each request from the current UTC date; nothing is stored.
/// Order follows the project list (newest project first).
pub async fn notifications_get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<Notification>> {
    let today = Utc::now().date_naive();
    let notifications: Vec<Notification> = state
        .store
        .list_projects(user.id)
        .await?
        .iter()
        .flat_map(|project| project.check_for_notifications(today))
        .collect();

    Ok(ApiResponse::success(notifications))
}
