//! Notification feed handler

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::warn;

use crate::{AppState, error::ApiResult, middleware::AuthUser, notifications};

/// Derived notifications for the caller
///
/// An unreadable role only hides the approval entries.
pub async fn notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let role = state
        .user_repository
        .find_role(user.id)
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to fetch role for {}: {}", user.id, e);
            None
        });

    let feed = notifications::feed(&state.notification_repository, user.id, role, Utc::now()).await;
    Ok(Json(feed))
}
