use axum::{extract::State, Extension};
use serde::Deserialize;
use validator::Validate;

use crate::api::format::{flexible_bool, parse_date, validate_not_blank};
use crate::app::AppState;
use crate::database::models::{NewProject, Priority, Project};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Ensure this field has no more than 5000 characters."))]
    pub description: Option<String>,

    /// `YYYY-MM-DD`
    pub due_date: Option<String>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub completed: bool,
}

/// GET /api/projects - The caller's projects, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<Project>> {
    let projects = state.store.list_projects(user.id).await?;
    tracing::debug!(user_id = %user.id, count = projects.len(), "Listed projects");
    Ok(ApiResponse::success(projects))
}

/// POST /api/projects - Create a project owned by the caller
///
/// Expected Input:
/// ```json
/// { "title": "Thesis", "description": "Chapter 2", "due_date": "2024-06-01",
///   "priority": "high", "completed": false }
/// ```
///
/// Creating a project that is already completed does not earn points.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<Project> {
    let due_date = payload
        .due_date
        .as_deref()
        .map(|raw| parse_date("due_date", raw))
        .transpose()?;

    let project = state
        .store
        .create_project(
            user.id,
            NewProject {
                title: payload.title.unwrap_or_default(),
                description: payload.description,
                due_date,
                priority: payload.priority,
                completed: payload.completed,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, project_id = %project.id, "Project created");

    Ok(ApiResponse::created(project))
}
