//! Booking handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use super::storage_error;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Query},
    guard::Caller,
    middleware::AuthUser,
    models::bookings::{BookingQuery, CreateBookingRequest},
};

/// Bookings of every resource, or of `resource_id` only
pub async fn list_resource_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state
        .booking_repository
        .list_bookings(query.resource_id)
        .await
        .map_err(storage_error("list bookings"))?;

    Ok(Json(bookings))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let bookings = state
        .booking_repository
        .for_user(user.id)
        .await
        .map_err(storage_error("list user bookings"))?;

    Ok(Json(bookings))
}

/// Request a booking; it starts out pending
pub async fn create_booking(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_booking = payload.validate().map_err(ApiError::BadRequest)?;

    state
        .resource_repository
        .find_by_id(new_booking.resource_id)
        .await
        .map_err(storage_error("fetch resource"))?
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;

    let booking = state
        .booking_repository
        .create(caller.id, &new_booking)
        .await
        .map_err(storage_error("create booking"))?;

    info!(booking_id = %booking.id, resource_id = %booking.resource_id, "Booking requested");
    Ok((StatusCode::CREATED, Json(booking)))
}
