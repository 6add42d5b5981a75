use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use homewatch_traits::{CalendarEvent, CollaboratorError, EntityState, HomeAssistantSource, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{endpoint, http_client, parse_base_url, send_json, with_bearer};

/// Start or end of a calendar event: timed events carry `dateTime`, all-day ones `date`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<DateTime<chrono::FixedOffset>>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    summary: String,
    start: EventTime,
}

fn all_day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)?
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn convert_event(raw: RawEvent) -> Result<CalendarEvent> {
    let (start, all_day) = match (raw.start.date_time, raw.start.date) {
        (Some(at), _) => (at.with_timezone(&Utc), false),
        (None, Some(date)) => (
            all_day_start(date)
                .ok_or_else(|| CollaboratorError::Parse(format!("Invalid event date {}", date)))?,
            true,
        ),
        (None, None) => {
            return Err(CollaboratorError::Parse(format!(
                "Event '{}' has no start",
                raw.summary
            )));
        }
    };
    Ok(CalendarEvent {
        summary: raw.summary,
        start,
        all_day,
    })
}

/// Home Assistant REST API client.
pub struct HomeAssistantClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl HomeAssistantClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            base_url: parse_base_url(base_url)?,
            token: token.into(),
        })
    }
}

#[async_trait]
impl HomeAssistantSource for HomeAssistantClient {
    async fn get_all_entity_states(&self) -> Result<Vec<EntityState>> {
        let url = endpoint(&self.base_url, &["api", "states"])?;
        let states: Vec<EntityState> =
            send_json(with_bearer(self.client.get(url), Some(&self.token))).await?;
        debug!(count = states.len(), "Fetched entity states");
        Ok(states)
    }

    async fn get_calendar_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let mut url = endpoint(&self.base_url, &["api", "calendars", calendar_id])?;
        url.query_pairs_mut()
            .append_pair("start", &from.to_rfc3339())
            .append_pair("end", &to.to_rfc3339());

        let raw: Vec<RawEvent> =
            send_json(with_bearer(self.client.get(url), Some(&self.token))).await?;
        raw.into_iter().map(convert_event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_and_all_day_events() {
        let raw: Vec<RawEvent> = serde_json::from_str(
            r#"[
                {"summary": "Dentist", "start": {"dateTime": "2026-03-11T09:15:00+01:00"}, "end": {"dateTime": "2026-03-11T10:00:00+01:00"}},
                {"summary": "Bins out", "start": {"date": "2026-03-11"}, "end": {"date": "2026-03-12"}}
            ]"#,
        )
        .unwrap();
        let events: Vec<CalendarEvent> = raw.into_iter().map(|r| convert_event(r).unwrap()).collect();

        assert_eq!(events[0].summary, "Dentist");
        assert!(!events[0].all_day);
        assert_eq!(events[0].start.to_rfc3339(), "2026-03-11T08:15:00+00:00");
        assert!(events[1].all_day);
        assert_eq!(
            events[1].start.with_timezone(&Local).date_naive(),
            NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()
        );
    }

    #[test]
    fn test_event_without_start_is_parse_error() {
        let raw: RawEvent = serde_json::from_str(r#"{"summary": "?", "start": {}}"#).unwrap();
        assert!(matches!(convert_event(raw), Err(CollaboratorError::Parse(_))));
    }
}
