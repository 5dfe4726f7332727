use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::format::{
    check_max_length, double_option, optional_flexible_bool, parse_date, parse_id, validate_not_blank,
};
use crate::app::AppState;
use crate::database::models::{Priority, Project, ProjectChanges};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidatedJson};

const NOT_FOUND: &str = "Project not found";

/// Partial update. `description` and `due_date` accept `null` to clear.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(
        length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,

    pub priority: Option<Priority>,

    #[serde(default, deserialize_with = "optional_flexible_bool")]
    pub completed: Option<bool>,
}

impl UpdateProjectRequest {
    fn into_changes(self) -> Result<ProjectChanges, ApiError> {
        check_max_length("description", self.description.as_ref().and_then(|d| d.as_deref()), 5000)?;

        let due_date = match self.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_date("due_date", &raw)?)),
        };

        Ok(ProjectChanges {
            title: self.title,
            description: self.description,
            due_date,
            priority: self.priority,
            completed: self.completed,
        })
    }
}

/// GET /api/projects/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Project> {
    let id = parse_id(&id, "Project")?;
    let project = state
        .store
        .find_project(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(ApiResponse::success(project))
}

/// PATCH /api/projects/:id - Partial update
///
/// Moving a project from open to completed credits the owner with
/// `COMPLETION_REWARD` points in the same atomic unit as the update. Repeating
/// `completed: true` on a completed project, or reopening it, changes no points.
///
/// Ownership is checked before the body is validated, so a foreign or missing
/// project is a 404 whatever the payload.
pub async fn patch(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    body: Result<ValidatedJson<UpdateProjectRequest>, ApiError>,
) -> ApiResult<Project> {
    let id = parse_id(&id, "Project")?;
    if state.store.find_project(user.id, id).await?.is_none() {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let ValidatedJson(payload) = body?;
    let changes = payload.into_changes()?;

    let update = state
        .store
        .update_project(user.id, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    if update.reward_awarded {
        tracing::info!(
            user_id = %user.id,
            project_id = %id,
            reward = update.reward,
            "Project completed, reward credited"
        );
    } else {
        tracing::debug!(user_id = %user.id, project_id = %id, "Project updated");
    }

    Ok(ApiResponse::success(update.project))
}

/// DELETE /api/projects/:id - 204 with an empty body
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "Project")?;
    if !state.store.delete_project(user.id, id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    tracing::info!(user_id = %user.id, project_id = %id, "Project deleted");
    Ok(ApiResponse::no_content())
}
