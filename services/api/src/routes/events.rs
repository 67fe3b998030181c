//! Event and attendance handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::storage_error;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path},
    guard::Caller,
    middleware::AuthUser,
    models::events::{CreateEventRequest, EVENT_STATUS_ACTIVE, EventDetail},
};

pub async fn list_events(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let events = state
        .event_repository
        .list()
        .await
        .map_err(storage_error("list events"))?;

    Ok(Json(events))
}

/// Single event with its organizer
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(id)
        .await
        .map_err(storage_error("fetch event"))?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let organizer = match event.organizer_id {
        Some(organizer_id) => state
            .event_repository
            .find_organizer(organizer_id)
            .await
            .map_err(storage_error("fetch event organizer"))?,
        None => None,
    };

    Ok(Json(EventDetail { event, organizer }))
}

pub async fn create_event(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_event = payload.validate().map_err(ApiError::BadRequest)?;

    let event = state
        .event_repository
        .create(caller.id, &new_event)
        .await
        .map_err(storage_error("create event"))?;

    info!(event_id = %event.id, organizer_id = %caller.id, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_attendees(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let attendees = state
        .event_repository
        .attendees(id)
        .await
        .map_err(storage_error("list attendees"))?;

    Ok(Json(attendees))
}

/// Register the caller for an active event
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(id)
        .await
        .map_err(storage_error("fetch event"))?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if event.status != EVENT_STATUS_ACTIVE {
        return Err(ApiError::BadRequest(
            "This event is not currently accepting registrations".to_string(),
        ));
    }

    let attendee = state
        .event_repository
        .register(id, user.id)
        .await
        .map_err(storage_error("register for event"))?
        .ok_or_else(|| {
            ApiError::BadRequest("You are already registered for this event".to_string())
        })?;

    info!(event_id = %id, user_id = %user.id, "Registered for event");
    Ok((StatusCode::CREATED, Json(attendee)))
}

pub async fn unregister(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let removed = state
        .event_repository
        .unregister(id, user.id)
        .await
        .map_err(storage_error("unregister from event"))?;

    if !removed {
        return Err(ApiError::NotFound(
            "You are not registered for this event".to_string(),
        ));
    }

    info!(event_id = %id, user_id = %user.id, "Unregistered from event");
    Ok(Json(json!({ "message": "Successfully unregistered from event" })))
}
