//! Upcoming calendar events.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Days, Local, TimeZone, Utc};
use homewatch_traits::CalendarEvent;
use std::fmt::Display;

use super::ActionContext;
use super::format::relative_time;
use crate::models::TaskReport;

/// Local midnight `days` after the day of `now`.
fn midnight_after<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> Option<DateTime<Utc>> {
    let date = now.date_naive().checked_add_days(Days::new(days))?;
    date.and_hms_opt(0, 0, 0)?
        .and_local_timezone(now.timezone())
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Tomorrow, and the span after tomorrow up to `days_in_future` days from today.
pub fn windows<Tz: TimeZone>(
    now: &DateTime<Tz>,
    days_in_future: u32,
) -> Option<((DateTime<Utc>, DateTime<Utc>), Option<(DateTime<Utc>, DateTime<Utc>)>)> {
    let tomorrow = midnight_after(now, 1)?;
    let day_after = midnight_after(now, 2)?;

    let upcoming = if days_in_future > 1 {
        Some((day_after, midnight_after(now, u64::from(days_in_future) + 1)?))
    } else {
        None
    };
    Some(((tomorrow, day_after), upcoming))
}

fn render_event<Tz: TimeZone>(now: &DateTime<Tz>, event: &CalendarEvent, with_date: bool) -> String
where
    Tz::Offset: Display,
{
    let start = event.start.with_timezone(&now.timezone());
    let when = match (event.all_day, with_date) {
        (true, false) => "all day".to_string(),
        (true, true) => start.format("%a %d %b").to_string(),
        (false, false) => start.format("%H:%M").to_string(),
        (false, true) => start.format("%a %d %b %H:%M").to_string(),
    };
    format!(
        "- {} ({}, {})",
        event.summary,
        when,
        relative_time(now.with_timezone(&Utc), event.start)
    )
}

/// `None` when both lists are empty.
pub fn render_events<Tz: TimeZone>(
    now: &DateTime<Tz>,
    tomorrow: &[CalendarEvent],
    upcoming: &[CalendarEvent],
) -> Option<String>
where
    Tz::Offset: Display,
{
    if tomorrow.is_empty() && upcoming.is_empty() {
        return None;
    }

    let mut sections = Vec::new();
    if !tomorrow.is_empty() {
        let lines: Vec<String> = tomorrow
            .iter()
            .map(|e| render_event(now, e, false))
            .collect();
        sections.push(format!("Tomorrow:\n{}", lines.join("\n")));
    }
    if !upcoming.is_empty() {
        let lines: Vec<String> = upcoming
            .iter()
            .map(|e| render_event(now, e, true))
            .collect();
        sections.push(format!("Upcoming:\n{}", lines.join("\n")));
    }
    Some(sections.join("\n\n"))
}

fn sorted(mut events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
    events.sort_by_key(|e| e.start);
    events
}

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let calendar = ctx
        .task
        .calendar_entity
        .as_deref()
        .ok_or_else(|| anyhow!("Task '{}' has no calendar entity", ctx.task.name))?;
    let home_assistant = &ctx.collaborators.home_assistant;

    let now = Local::now();
    let ((from, to), upcoming_window) = windows(&now, ctx.task.calendar_days_in_future)
        .ok_or_else(|| anyhow!("Unable to compute calendar window"))?;

    let tomorrow = home_assistant
        .get_calendar_events(calendar, from, to)
        .await
        .context("Failed to fetch tomorrow's events")?;
    let upcoming = match upcoming_window {
        Some((from, to)) => home_assistant
            .get_calendar_events(calendar, from, to)
            .await
            .context("Failed to fetch upcoming events")?,
        None => Vec::new(),
    };

    match render_events(&now, &sorted(tomorrow), &sorted(upcoming)) {
        Some(message) => Ok(TaskReport::new(message)),
        None => Ok(TaskReport::silent()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskType};
    use crate::testkit::TestHarness;
    use chrono::Duration;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_windows() {
        let now = at("2026-03-10T15:30:00Z");
        let ((from, to), upcoming) = windows(&now, 7).unwrap();
        assert_eq!(from, at("2026-03-11T00:00:00Z"));
        assert_eq!(to, at("2026-03-12T00:00:00Z"));
        assert_eq!(
            upcoming,
            Some((at("2026-03-12T00:00:00Z"), at("2026-03-18T00:00:00Z")))
        );

        let (_, upcoming) = windows(&now, 1).unwrap();
        assert!(upcoming.is_none());
    }

    #[test]
    fn test_render_events() {
        let now = at("2026-03-10T15:30:00Z");
        let tomorrow = vec![
            CalendarEvent {
                summary: "Bins out".into(),
                start: at("2026-03-11T00:00:00Z"),
                all_day: true,
            },
            CalendarEvent {
                summary: "Dentist".into(),
                start: at("2026-03-11T09:15:00Z"),
                all_day: false,
            },
        ];
        let upcoming = vec![CalendarEvent {
            summary: "Flight".into(),
            start: at("2026-03-14T06:00:00Z"),
            all_day: false,
        }];

        let text = render_events(&now, &tomorrow, &upcoming).unwrap();
        assert_eq!(
            text,
            "Tomorrow:\n\
             - Bins out (all day, in 8 hours)\n\
             - Dentist (09:15, in 17 hours)\n\n\
             Upcoming:\n\
             - Flight (Sat 14 Mar 06:00, in 3 days)"
        );
    }

    #[test]
    fn test_render_nothing() {
        assert!(render_events(&Utc::now(), &[], &[]).is_none());
    }

    #[tokio::test]
    async fn test_no_events_force_stops() {
        let harness = TestHarness::new();
        let mut task = Task::new("Calendar").with_type(TaskType::TomorrowEventsHa);
        task.calendar_entity = Some("calendar.family".into());

        let report = run(&harness.context(&task)).await.unwrap();
        assert!(report.force_stop);
        assert_eq!(harness.home_assistant.calendar_queries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_events_are_reported() {
        let harness = TestHarness::new();
        harness
            .home_assistant
            .set_events(vec![CalendarEvent {
                summary: "Parcel".into(),
                start: Utc::now() + Duration::days(1),
                all_day: false,
            }])
            .await;
        let mut task = Task::new("Calendar").with_type(TaskType::TomorrowEventsHa);
        task.calendar_entity = Some("calendar.family".into());

        let report = run(&harness.context(&task)).await.unwrap();
        assert!(!report.force_stop);
        assert!(report.message.contains("Parcel"));
    }

    #[tokio::test]
    async fn test_missing_calendar_entity_is_error() {
        let harness = TestHarness::new();
        let task = Task::new("Calendar").with_type(TaskType::TomorrowEventsHa);
        assert!(run(&harness.context(&task)).await.is_err());
    }
}
