//! Resource catalogue, approval and availability handlers

use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use campus_common::{
    Permission, Role,
    availability::{self, AvailabilityView},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::storage_error;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path},
    guard::Caller,
    middleware::AuthUser,
    models::resources::{ApproveResourceRequest, CreateResourceRequest},
};

/// Whether a caller whose role lookup gave `role` sees unapproved resources
///
/// An unreadable role counts as a plain user.
fn sees_unapproved(user_id: Uuid, role: anyhow::Result<Option<Role>>) -> bool {
    match role {
        Ok(role) => Permission::ManageContent.allows(role),
        Err(e) => {
            warn!("Failed to fetch role for {}, listing approved resources: {}", user_id, e);
            false
        }
    }
}

/// Approved resources for everyone; organizers and admins also see the rest
pub async fn list_resources(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
) -> ApiResult<impl IntoResponse> {
    let include_unapproved = match user {
        Some(Extension(user)) => {
            sees_unapproved(user.id, state.user_repository.find_role(user.id).await)
        }
        None => false,
    };

    let resources = state
        .resource_repository
        .list(include_unapproved)
        .await
        .map_err(storage_error("list resources"))?;

    Ok(Json(resources))
}

pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let resource = state
        .resource_repository
        .find_by_id(id)
        .await
        .map_err(storage_error("fetch resource"))?
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;

    Ok(Json(resource))
}

/// Resources created by admins skip the approval queue
pub async fn create_resource(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateResourceRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_resource = payload.validate().map_err(ApiError::BadRequest)?;
    let approved_by = caller
        .has(Permission::ApproveResources)
        .then_some(caller.id);

    let resource = state
        .resource_repository
        .create(caller.id, &new_resource, approved_by)
        .await
        .map_err(storage_error("create resource"))?;

    info!(resource_id = %resource.id, status = %resource.status, "Resource created");
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn approve_resource(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveResourceRequest>,
) -> ApiResult<impl IntoResponse> {
    let decision = payload.decision().map_err(ApiError::BadRequest)?;

    let resource = state
        .resource_repository
        .set_status(id, decision, caller.id)
        .await
        .map_err(storage_error("update resource status"))?
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;

    info!(resource_id = %id, status = decision.as_str(), admin_id = %caller.id, "Resource reviewed");
    Ok(Json(resource))
}

/// Availability computed from a fresh booking snapshot
pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state
        .resource_repository
        .find_by_id(id)
        .await
        .map_err(storage_error("fetch resource"))?
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;

    let slots = state
        .booking_repository
        .slots_for_resource(id)
        .await
        .map_err(storage_error("fetch bookings"))?;

    let view = AvailabilityView::from(availability::resolve(&slots, id, Utc::now()));
    Ok(Json(view))
}
