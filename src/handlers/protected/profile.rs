use axum::{extract::State, Extension};
use serde::Deserialize;
use validator::Validate;

use crate::api::format::{check_max_length, double_option, validate_username};
use crate::app::AppState;
use crate::database::models::{ProfileChanges, UserProfile};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidatedJson};

/// Profile update body. Unknown keys such as `id` and `reward` are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 3, max = 150, message = "Ensure this field has between 3 and 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub profile_picture: Option<Option<String>>,
}

/// GET /api/profile - The authenticated user's profile
pub async fn profile_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(UserProfile::from(&user)))
}

/// PUT /api/profile - Update any subset of the profile fields
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    check_max_length("profile_picture", payload.profile_picture.as_ref().and_then(|p| p.as_deref()), 500)?;

    let mut field_errors = FieldErrors::new();
    if let Some(username) = &payload.username {
        if state.store.username_taken(username, Some(user.id)).await? {
            field_errors.insert(
                "username".to_string(),
                vec!["A user with that username already exists.".to_string()],
            );
        }
    }
    if let Some(email) = &payload.email {
        if state.store.email_taken(email, Some(user.id)).await? {
            field_errors.insert(
                "email".to_string(),
                vec!["A user with that email already exists.".to_string()],
            );
        }
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Invalid input", Some(field_errors)));
    }

    let changes = ProfileChanges {
        username: payload.username,
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        profile_picture: payload.profile_picture,
    };
    let updated = state.store.update_profile(user.id, changes).await?;

    tracing::info!(user_id = %updated.id, "Profile updated");

    Ok(ApiResponse::success(UserProfile::from(&updated)))
}
