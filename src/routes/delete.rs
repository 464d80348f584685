use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::constants::ERR_USER_ID_REQUIRED;
use crate::error::{AppError, Result};
use crate::routes::extract::AppJson;
use crate::routes::validation::required;
use crate::services::{deregister, FailedStep};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "failedSteps", skip_serializing_if = "Vec::is_empty")]
    pub failed_steps: Vec<FailedStep>,
}

/// Delete a user account and all associated data
///
/// Purges every user-owned table, then the profile, then the login identity.
/// A table that fails to purge is skipped and listed in `failedSteps`; only an
/// identity provider failure fails the request.
///
/// # Note
/// This action is irreversible. When the identity step fails, the user's data
/// is already gone while the login still exists.
pub async fn delete_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteUserRequest>,
) -> Result<Json<DeleteUserResponse>> {
    let user_id = required(&payload.user_id)
        .ok_or_else(|| AppError::Validation(ERR_USER_ID_REQUIRED.to_string()))?;

    let report = deregister(state.store.as_ref(), state.identity.as_ref(), user_id).await?;

    Ok(Json(DeleteUserResponse {
        success: true,
        message: "User and all associated data deleted successfully".to_string(),
        failed_steps: report.failed_steps(),
    }))
}
