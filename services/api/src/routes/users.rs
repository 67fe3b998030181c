//! Profile and role sync handlers

use axum::{extract::State, response::IntoResponse};
use campus_common::{Role, roles::PermissionSet};
use tracing::info;

use super::storage_error;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    middleware::AuthUser,
    models::{
        non_blank,
        users::{MeResponse, SyncRoleResponse, UpdateProfileRequest},
    },
    validation::{validate_email, validate_full_name},
};

/// Current user's profile with the permission flags of its stored role
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let profile = state
        .user_repository
        .find_by_id(user.id)
        .await
        .map_err(storage_error("fetch user profile"))?
        .ok_or_else(|| ApiError::NotFound("User profile not found".to_string()))?;

    let permissions = PermissionSet::for_role(Role::parse_lenient(&profile.role));

    Ok(Json(MeResponse {
        profile,
        permissions,
    }))
}

/// Update display name and/or email
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let full_name = non_blank(&payload.full_name);
    let email = non_blank(&payload.email);

    if full_name.is_none() && email.is_none() {
        return Err(ApiError::BadRequest(
            "At least one field (full_name or email) is required".to_string(),
        ));
    }
    if let Some(full_name) = full_name {
        validate_full_name(full_name).map_err(ApiError::BadRequest)?;
    }
    if let Some(email) = email {
        validate_email(email).map_err(ApiError::BadRequest)?;
    }

    let profile = state
        .user_repository
        .update_profile(user.id, full_name, email)
        .await
        .map_err(storage_error("update profile"))?
        .ok_or_else(|| ApiError::NotFound("User profile not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(profile))
}

/// Copy the signup-time role and name from the token into the user row
pub async fn sync_role(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let role = user
        .metadata
        .role
        .as_deref()
        .and_then(Role::parse_lenient)
        .unwrap_or(Role::User);

    let email = user.email.clone().unwrap_or_default();
    let full_name = non_blank(&user.metadata.full_name)
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let profile = state
        .user_repository
        .upsert_from_metadata(user.id, &email, &full_name, role)
        .await
        .map_err(|e| {
            tracing::error!("Failed to sync role for {}: {}", user.id, e);
            ApiError::InternalServerError
        })?;

    info!(user_id = %user.id, %role, "Role synced from signup metadata");

    let message = format!("Role synced to: {}", profile.role);
    Ok(Json(SyncRoleResponse {
        success: true,
        user: profile,
        message,
    }))
}
