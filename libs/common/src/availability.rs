//! Booking availability resolver
//!
//! Derives whether a resource is occupied right now, and until when it stays
//! free, from a snapshot of its bookings. Nothing here is persisted: callers
//! fetch a fresh snapshot and resolve it every time they need an answer.
//!
//! Overlapping bookings are not rejected anywhere. When several bookings cover
//! `now`, the first one in snapshot order is reported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a booking in this state holds its time window
    pub fn occupies(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// The part of a booking the resolver looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSlot {
    pub resource_id: Uuid,
    pub status: BookingStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl BookingSlot {
    /// Build a slot from stored columns.
    ///
    /// Returns `None` for rows with a missing timestamp or a status string
    /// outside the known set; such rows cannot take part in the computation.
    pub fn from_parts(
        resource_id: Uuid,
        status: &str,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let status = match status.parse::<BookingStatus>() {
            Ok(status) => status,
            Err(e) => {
                debug!(%resource_id, "Skipping booking: {}", e);
                return None;
            }
        };

        let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
            debug!(%resource_id, "Skipping booking without a complete time window");
            return None;
        };

        Some(Self {
            resource_id,
            status,
            start_time,
            end_time,
        })
    }

    /// Inclusive on both ends
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }
}

/// Resolved availability of one resource at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// An active booking holds the resource until `until`
    Booked { until: DateTime<Utc> },
    /// No current or upcoming booking
    AvailableNow,
    /// Free now, next booking starts at `next_start`
    AvailableUntil { next_start: DateTime<Utc> },
    /// Between bookings with no active one; free once `last_end` passes
    AvailableAfter { last_end: DateTime<Utc> },
}

impl Availability {
    pub fn is_booked(&self) -> bool {
        matches!(self, Availability::Booked { .. })
    }

    pub fn available_after(&self) -> Option<DateTime<Utc>> {
        match *self {
            Availability::Booked { until } => Some(until),
            Availability::AvailableAfter { last_end } => Some(last_end),
            Availability::AvailableNow | Availability::AvailableUntil { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match *self {
            Availability::Booked { until } => format!("Booked until {}", format_instant(until)),
            Availability::AvailableNow => "Available now".to_string(),
            Availability::AvailableUntil { next_start } => {
                format!("Available until {}", format_instant(next_start))
            }
            Availability::AvailableAfter { last_end } => {
                format!("Available after {}", format_instant(last_end))
            }
        }
    }
}

/// Wire shape of an availability answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityView {
    pub status: &'static str,
    pub message: String,
    pub available_after: Option<DateTime<Utc>>,
}

impl From<Availability> for AvailabilityView {
    fn from(availability: Availability) -> Self {
        Self {
            status: if availability.is_booked() {
                "booked"
            } else {
                "available"
            },
            message: availability.message(),
            available_after: availability.available_after(),
        }
    }
}

/// "Mar 10 at 2:00 PM"
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%b %-d at %-I:%M %p").to_string()
}

fn occupying(slots: &[BookingSlot], resource_id: Uuid) -> impl Iterator<Item = &BookingSlot> {
    slots
        .iter()
        .filter(move |slot| slot.resource_id == resource_id && slot.status.occupies())
}

/// The booking holding the resource at `now`, if any
pub fn current_booking(
    slots: &[BookingSlot],
    resource_id: Uuid,
    now: DateTime<Utc>,
) -> Option<&BookingSlot> {
    occupying(slots, resource_id).find(|slot| slot.contains(now))
}

pub fn is_booked(slots: &[BookingSlot], resource_id: Uuid, now: DateTime<Utc>) -> bool {
    current_booking(slots, resource_id, now).is_some()
}

/// Resolve the availability of `resource_id` at `now`
pub fn resolve(slots: &[BookingSlot], resource_id: Uuid, now: DateTime<Utc>) -> Availability {
    if let Some(active) = current_booking(slots, resource_id, now) {
        return Availability::Booked {
            until: active.end_time,
        };
    }

    let mut upcoming: Vec<&BookingSlot> = occupying(slots, resource_id)
        .filter(|slot| slot.end_time > now)
        .collect();
    upcoming.sort_by_key(|slot| slot.start_time);

    let (Some(next), Some(last)) = (upcoming.first(), upcoming.last()) else {
        return Availability::AvailableNow;
    };

    if now < next.start_time {
        Availability::AvailableUntil {
            next_start: next.start_time,
        }
    } else {
        Availability::AvailableAfter {
            last_end: last.end_time,
        }
    }
}
