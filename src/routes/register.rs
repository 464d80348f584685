use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::ERR_REGISTRATION_FIELDS_REQUIRED;
use crate::error::{AppError, Result};
use crate::routes::extract::AppJson;
use crate::routes::validation::{optional, required};
use crate::services::{register, Registration};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(max = 120, message = "Full name must be at most 120 characters"))]
    pub full_name: Option<String>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub faculty: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Register a new user
///
/// Creates a confirmed login identity, then the matching profile. If the
/// profile cannot be written, the identity is deleted before the error is
/// returned.
///
/// Returns 400 without contacting the identity provider when email, password
/// or full name is missing.
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>> {
    let (Some(email), Some(full_name)) = (required(&payload.email), required(&payload.full_name))
    else {
        return Err(AppError::Validation(ERR_REGISTRATION_FIELDS_REQUIRED.to_string()));
    };
    if required(&payload.password).is_none() {
        return Err(AppError::Validation(ERR_REGISTRATION_FIELDS_REQUIRED.to_string()));
    }
    let email = email.to_ascii_lowercase();
    let full_name = full_name.to_string();

    payload.validate().map_err(|e| {
        tracing::warn!("Registration rejected: {}", e);
        AppError::from(e)
    })?;

    let registration = Registration {
        email,
        password: payload.password.unwrap_or_default(),
        full_name,
        student_id: optional(payload.student_id),
        department: optional(payload.department),
        faculty: optional(payload.faculty),
        phone: optional(payload.phone),
    };

    let user_id = register(state.store.as_ref(), state.identity.as_ref(), registration).await?;

    Ok(Json(CreateUserResponse {
        success: true,
        message: "User created successfully".to_string(),
        user_id,
    }))
}
