//! Analytics report: totals, a six-month activity series, resource type
//! shares and month-over-month changes.

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};

use crate::{
    models::stats::{AnalyticsChanges, AnalyticsReport, AnalyticsTotals, MonthlyActivity, TypeShare},
    repositories::StatsRepository,
};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const SERIES_MONTHS: u32 = 6;

/// (year, zero-based month) `back` months before `now`
fn month_key(now: DateTime<Utc>, back: u32) -> (i32, u32) {
    let index = now.year() * 12 + now.month0() as i32 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32)
}

/// First instant of the oldest month in the series
pub fn series_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month0) = month_key(now, SERIES_MONTHS - 1);
    Utc.with_ymd_and_hms(year, month0 + 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| now - Duration::days(31 * SERIES_MONTHS as i64))
}

/// Events and attendees per calendar month, oldest month first
pub fn monthly_series(now: DateTime<Utc>, activity: &[(DateTime<Utc>, i64)]) -> Vec<MonthlyActivity> {
    (0..SERIES_MONTHS)
        .rev()
        .map(|back| {
            let key = month_key(now, back);
            let in_month = activity
                .iter()
                .filter(|(start, _)| (start.year(), start.month0()) == key);

            let (events, attendees) =
                in_month.fold((0, 0), |(events, attendees), (_, count)| (events + 1, attendees + count));

            MonthlyActivity {
                month: MONTH_NAMES[key.1 as usize].to_string(),
                events,
                attendees,
            }
        })
        .collect()
}

/// "study_room" -> "Study room"
fn type_label(resource_type: &str) -> String {
    let mut chars = resource_type.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.collect();
            format!("{}{}", first.to_uppercase(), rest.replacen('_', " ", 1))
        }
        None => String::new(),
    }
}

/// Share of each resource type in whole percent, in order of first appearance
pub fn type_distribution(types: &[String]) -> Vec<TypeShare> {
    let mut counts: Vec<(&str, i64)> = Vec::new();
    for resource_type in types {
        match counts.iter().position(|(name, _)| *name == resource_type.as_str()) {
            Some(index) => counts[index].1 += 1,
            None => counts.push((resource_type.as_str(), 1)),
        }
    }

    let total = types.len() as f64;
    counts
        .into_iter()
        .map(|(name, count)| TypeShare {
            name: type_label(name),
            value: (count as f64 / total * 100.0).round() as i64,
        })
        .collect()
}

/// Whole-percent change; 0 when there is nothing to compare against
pub fn percent_change(current: i64, previous: i64) -> i64 {
    if previous <= 0 {
        return 0;
    }
    ((current - previous) as f64 / previous as f64 * 100.0).round() as i64
}

/// Assemble the full report at `now`
pub async fn report(stats: &StatsRepository, now: DateTime<Utc>) -> Result<AnalyticsReport> {
    let one_month_ago = now
        .checked_sub_months(Months::new(1))
        .unwrap_or(now - Duration::days(30));
    let two_months_ago = now
        .checked_sub_months(Months::new(2))
        .unwrap_or(now - Duration::days(60));

    let (
        total_events,
        total_attendees,
        total_bookings,
        activity,
        resource_types,
        (current_events, previous_events),
        (current_attendees, previous_attendees),
        (current_bookings, previous_bookings),
    ) = tokio::try_join!(
        stats.total_events(),
        stats.total_attendees(),
        stats.total_bookings(),
        stats.event_activity_since(series_start(now)),
        stats.approved_resource_types(),
        async {
            tokio::try_join!(
                stats.events_between(one_month_ago, None),
                stats.events_between(two_months_ago, Some(one_month_ago)),
            )
        },
        async {
            tokio::try_join!(
                stats.registrations_between(one_month_ago, None),
                stats.registrations_between(two_months_ago, Some(one_month_ago)),
            )
        },
        async {
            tokio::try_join!(
                stats.bookings_between(one_month_ago, None),
                stats.bookings_between(two_months_ago, Some(one_month_ago)),
            )
        },
    )?;

    Ok(AnalyticsReport {
        stats: AnalyticsTotals {
            total_events,
            total_attendees,
            total_bookings,
        },
        changes: AnalyticsChanges {
            events: percent_change(current_events, previous_events),
            attendees: percent_change(current_attendees, previous_attendees),
            bookings: percent_change(current_bookings, previous_bookings),
        },
        event_data: monthly_series(now, &activity),
        resource_data: type_distribution(&resource_types),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn series_covers_six_months_across_year_boundary() {
        let now = at(2025, 2, 15);
        let activity = vec![
            (at(2024, 9, 3), 10),
            (at(2024, 12, 24), 4),
            (at(2024, 12, 31), 6),
            (at(2025, 2, 1), 2),
            // outside the window
            (at(2024, 8, 30), 100),
            (at(2024, 2, 10), 100),
        ];

        let series = monthly_series(now, &activity);
        let months: Vec<&str> = series.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, ["Sep", "Oct", "Nov", "Dec", "Jan", "Feb"]);

        assert_eq!(series[0].events, 1);
        assert_eq!(series[0].attendees, 10);
        assert_eq!(series[3].events, 2);
        assert_eq!(series[3].attendees, 10);
        assert_eq!(series[4].events, 0);
        assert_eq!(series[5].attendees, 2);
    }

    #[test]
    fn series_start_is_first_of_oldest_month() {
        assert_eq!(
            series_start(at(2025, 2, 15)),
            Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn type_shares_round_to_whole_percent() {
        let types: Vec<String> = ["room", "study_room", "room", "lab_equipment_kit"]
            .into_iter()
            .map(String::from)
            .collect();

        let shares = type_distribution(&types);
        assert_eq!(
            shares,
            vec![
                TypeShare {
                    name: "Room".to_string(),
                    value: 50
                },
                TypeShare {
                    name: "Study room".to_string(),
                    value: 25
                },
                TypeShare {
                    name: "Lab equipment_kit".to_string(),
                    value: 25
                },
            ]
        );

        assert!(type_distribution(&[]).is_empty());
    }

    #[test]
    fn percent_change_handles_empty_baseline() {
        assert_eq!(percent_change(5, 0), 0);
        assert_eq!(percent_change(15, 10), 50);
        assert_eq!(percent_change(5, 10), -50);
        assert_eq!(percent_change(2, 3), -33);
    }
}
