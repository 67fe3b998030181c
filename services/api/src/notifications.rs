//! Notification feed assembly
//!
//! Four independent read-only queries run concurrently. A failing branch is
//! logged and contributes nothing.

use campus_common::Role;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::{
    models::notifications::{Notification, NotificationFeed, NotificationKind},
    repositories::{
        NotificationRepository,
        notifications::{BookingReminder, EventReminder, RecentMessage},
    },
};

/// Entries fetched per branch
const BRANCH_LIMIT: i64 = 5;
/// Entries returned in the feed
const FEED_LIMIT: usize = 10;
const PREVIEW_CHARS: usize = 50;

/// Build the feed for `user_id` at `now`
pub async fn feed(
    repository: &NotificationRepository,
    user_id: Uuid,
    role: Option<Role>,
    now: DateTime<Utc>,
) -> NotificationFeed {
    let horizon = now + Duration::hours(24);
    let since = now - Duration::hours(24);

    let approvals = async {
        if role != Some(Role::Admin) {
            return Ok(0);
        }
        repository.count_pending_resources().await
    };

    let (events, bookings, pending, messages) = tokio::join!(
        repository.upcoming_events(user_id, now, horizon, BRANCH_LIMIT),
        repository.upcoming_bookings(user_id, now, horizon, BRANCH_LIMIT),
        approvals,
        repository.recent_messages(user_id, since, BRANCH_LIMIT),
    );

    let mut notifications = Vec::new();
    notifications.extend(
        or_empty("events", events)
            .iter()
            .map(|event| event_notification(event, now)),
    );
    notifications.extend(
        or_empty("bookings", bookings)
            .iter()
            .map(|booking| booking_notification(booking, now)),
    );
    notifications.extend(approval_notification(or_empty("approvals", pending), now));
    notifications.extend(or_empty("messages", messages).iter().map(message_notification));

    merge(notifications)
}

fn or_empty<T: Default>(branch: &str, result: anyhow::Result<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!(branch, "Notification branch failed: {}", e);
        T::default()
    })
}

/// Newest first, capped, with the unread count taken over everything
pub fn merge(mut notifications: Vec<Notification>) -> NotificationFeed {
    notifications.sort_by(|a, b| b.time.cmp(&a.time));
    let unread_count = notifications.iter().filter(|n| n.unread).count();
    notifications.truncate(FEED_LIMIT);

    NotificationFeed {
        notifications,
        unread_count,
    }
}

/// Whole hours until `start`, rounded to nearest
fn hours_until(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((start - now).num_seconds() as f64 / 3600.0).round() as i64
}

fn plural(count: i64, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn event_notification(event: &EventReminder, now: DateTime<Utc>) -> Notification {
    Notification {
        id: format!("event-{}", event.id),
        kind: NotificationKind::Event,
        title: "Upcoming Event".to_string(),
        message: format!(
            "{} starts in {}",
            event.title,
            plural(hours_until(event.start_date, now), "hour")
        ),
        link: format!("/dashboard/events/{}", event.id),
        time: event.start_date,
        unread: true,
    }
}

fn booking_notification(booking: &BookingReminder, now: DateTime<Utc>) -> Notification {
    Notification {
        id: format!("booking-{}", booking.id),
        kind: NotificationKind::Booking,
        title: "Upcoming Booking".to_string(),
        message: format!(
            "Your booking for {} starts in {}",
            booking.resource_name,
            plural(hours_until(booking.start_time, now), "hour")
        ),
        link: format!("/dashboard/resources/{}", booking.resource_id),
        time: booking.start_time,
        unread: true,
    }
}

fn approval_notification(pending: i64, now: DateTime<Utc>) -> Option<Notification> {
    (pending > 0).then(|| Notification {
        id: "pending-approvals".to_string(),
        kind: NotificationKind::Approval,
        title: "Resource Approvals".to_string(),
        message: format!("{} pending approval", plural(pending, "resource")),
        link: "/dashboard/resources/approvals".to_string(),
        time: now,
        unread: true,
    })
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn message_notification(message: &RecentMessage) -> Notification {
    let sender = message.sender_name.as_deref().unwrap_or("Someone");

    Notification {
        id: format!("message-{}", message.id),
        kind: NotificationKind::Message,
        title: format!("New message in {}", message.community_name),
        message: format!("{}: {}", sender, preview(&message.message)),
        link: format!("/dashboard/communities/{}", message.community_id),
        time: message.created_at,
        unread: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn note(id: &str, time: DateTime<Utc>) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::Message,
            title: String::new(),
            message: String::new(),
            link: String::new(),
            time,
            unread: true,
        }
    }

    #[test]
    fn merge_sorts_newest_first_and_counts_everything() {
        let notes = (0..12).map(|i| note(&format!("n{i}"), at(i, 0))).collect();

        let feed = merge(notes);
        assert_eq!(feed.notifications.len(), 10);
        assert_eq!(feed.unread_count, 12);
        assert_eq!(feed.notifications[0].id, "n11");
        assert_eq!(feed.notifications[9].id, "n2");
    }

    #[test]
    fn event_reminder_rounds_hours() {
        let event = EventReminder {
            id: Uuid::nil(),
            title: "Career Fair".to_string(),
            start_date: at(11, 40),
        };

        let notification = event_notification(&event, at(10, 0));
        assert_eq!(notification.message, "Career Fair starts in 2 hours");
        assert_eq!(notification.link, format!("/dashboard/events/{}", Uuid::nil()));

        let soon = event_notification(&event, at(10, 45));
        assert_eq!(soon.message, "Career Fair starts in 1 hour");
    }

    #[test]
    fn booking_reminder_names_the_resource() {
        let booking = BookingReminder {
            id: Uuid::new_v4(),
            resource_id: Uuid::new_v4(),
            resource_name: "Lab 3".to_string(),
            start_time: at(13, 0),
        };

        let notification = booking_notification(&booking, at(10, 0));
        assert_eq!(notification.message, "Your booking for Lab 3 starts in 3 hours");
        assert_eq!(notification.kind, NotificationKind::Booking);
    }

    #[test]
    fn approvals_only_when_something_is_pending() {
        assert!(approval_notification(0, at(9, 0)).is_none());

        let one = approval_notification(1, at(9, 0)).unwrap();
        assert_eq!(one.message, "1 resource pending approval");

        let many = approval_notification(4, at(9, 0)).unwrap();
        assert_eq!(many.message, "4 resources pending approval");
    }

    #[test]
    fn long_messages_are_previewed() {
        let message = RecentMessage {
            id: Uuid::new_v4(),
            message: "x".repeat(60),
            created_at: at(8, 0),
            community_id: Uuid::new_v4(),
            community_name: "Chess Club".to_string(),
            sender_name: Some("Ada".to_string()),
        };

        let notification = message_notification(&message);
        assert_eq!(notification.title, "New message in Chess Club");
        assert_eq!(notification.message, format!("Ada: {}...", "x".repeat(50)));

        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"y".repeat(50)), "y".repeat(50));
    }

    #[test]
    fn failed_branch_counts_as_empty() {
        let failed: anyhow::Result<Vec<EventReminder>> = Err(anyhow::anyhow!("timeout"));
        assert!(or_empty("events", failed).is_empty());
    }
}
