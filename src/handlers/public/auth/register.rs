use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::api::format::validate_username;
use crate::app::AppState;
use crate::auth::hash_password;
use crate::database::models::NewUser;
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 3, max = 150, message = "Ensure this field has between 3 and 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 8, max = 128, message = "Ensure this field has between 8 and 128 characters.")
    )]
    pub password: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,

    #[validate(length(max = 500, message = "Ensure this field has no more than 500 characters."))]
    pub profile_picture: Option<String>,
}

/// POST /api/auth/register - Create a new account
///
/// Expected Input:
/// ```json
/// { "username": "ada", "email": "ada@example.com", "password": "********",
///   "first_name": "Ada", "last_name": "Lovelace" }
/// ```
///
/// Returns 201 `{ "message": "User created successfully" }`, or 400 with
/// `field_errors` for invalid or already-taken values.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<Value> {
    let username = payload.username.unwrap_or_default();
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let mut field_errors = FieldErrors::new();
    if state.store.username_taken(&username, None).await? {
        field_errors.insert(
            "username".to_string(),
            vec!["A user with that username already exists.".to_string()],
        );
    }
    if state.store.email_taken(&email, None).await? {
        field_errors.insert(
            "email".to_string(),
            vec!["A user with that email already exists.".to_string()],
        );
    }
    if !field_errors.is_empty() {
        tracing::debug!(username = %username, "Registration rejected: {:?}", field_errors.keys());
        return Err(ApiError::validation_error("Invalid input", Some(field_errors)));
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let user = state
        .store
        .create_user(NewUser {
            username,
            email,
            first_name: payload.first_name.unwrap_or_default(),
            last_name: payload.last_name.unwrap_or_default(),
            password_hash,
            profile_picture: payload.profile_picture,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(ApiResponse::created(json!({ "message": "User created successfully" })))
}
