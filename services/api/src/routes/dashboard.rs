//! Dashboard and analytics handlers

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;

use super::storage_error;
use crate::{
    AppState, analytics,
    error::ApiResult,
    guard::Caller,
    models::stats::{DashboardCounters, DashboardEvent, DashboardStats},
};

const RECENT_EVENTS: i64 = 3;
const RECENT_BOOKINGS: i64 = 3;

/// Share of approved resources currently held by an active booking
fn resource_usage(active_bookings: i64, approved_resources: i64) -> String {
    if approved_resources <= 0 {
        return "0%".to_string();
    }
    let percent = (active_bookings as f64 / approved_resources as f64 * 100.0).round() as i64;
    format!("{percent}%")
}

pub async fn stats(State(state): State<AppState>, caller: Caller) -> ApiResult<impl IntoResponse> {
    let repo = &state.stats_repository;
    let now = Utc::now();

    let (upcoming, booked, joined, active_all, approved, events, bookings) = tokio::try_join!(
        repo.count_upcoming_events(now),
        repo.count_active_bookings(Some(caller.id), now),
        repo.count_memberships(caller.id),
        repo.count_active_bookings(None, now),
        repo.count_approved_resources(),
        repo.upcoming_events(now, RECENT_EVENTS),
        repo.active_bookings(caller.id, now, RECENT_BOOKINGS),
    )
    .map_err(storage_error("load dashboard stats"))?;

    let event_ids: Vec<_> = events.iter().map(|event| event.id).collect();
    let attending = repo
        .attending(caller.id, &event_ids)
        .await
        .map_err(storage_error("load event attendance"))?;

    let recent_events = events
        .into_iter()
        .map(|event| DashboardEvent {
            is_attending: attending.contains(&event.id),
            id: event.id,
            title: event.title,
            start_date: event.start_date,
            location: event.location,
            status: event.status,
        })
        .collect();

    Ok(Json(DashboardStats {
        stats: DashboardCounters {
            upcoming_events: upcoming,
            booked_resources: booked,
            communities_joined: joined,
            resource_usage: resource_usage(active_all, approved),
        },
        recent_events,
        user_bookings: bookings,
    }))
}

pub async fn analytics(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let report = analytics::report(&state.stats_repository, Utc::now())
        .await
        .map_err(storage_error("build analytics report"))?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_a_rounded_percentage() {
        assert_eq!(resource_usage(2, 5), "40%");
        assert_eq!(resource_usage(1, 3), "33%");
        assert_eq!(resource_usage(2, 3), "67%");
    }

    #[test]
    fn usage_without_resources_is_zero() {
        assert_eq!(resource_usage(4, 0), "0%");
    }
}
