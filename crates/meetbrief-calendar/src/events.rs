//! Google Calendar API v3 event types and normalization into meetings.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use meetbrief_core::types::{NewMeeting, MEETING_STATUS_PENDING};

// ============================================================================
// API response types (deserialized from Google Calendar JSON)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventListResponse {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
}

/// The subset of a Calendar event resource that meetings are built from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<EventDateTime>,
    #[serde(default)]
    pub end: Option<EventDateTime>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    /// Only presence matters: any conference attached makes the meeting online.
    #[serde(default)]
    pub conference_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl EventDateTime {
    fn value(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attendee {
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================================
// Normalization
// ============================================================================

/// Convert a Calendar event into a meeting draft.
///
/// Cancelled events yield `None`. Times that cannot be parsed fall back to a
/// one-hour slot starting at `now`.
pub fn normalize_event(event: GoogleEvent, now: DateTime<Utc>) -> Option<NewMeeting> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let start_raw = event.start.as_ref().and_then(EventDateTime::value);
    let end_raw = event.end.as_ref().and_then(EventDateTime::value);
    let (start_time, end_time) = match (
        start_raw.and_then(parse_event_datetime),
        end_raw.and_then(parse_event_datetime),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => (now, now + Duration::hours(1)),
    };

    let is_online = event.conference_data.is_some()
        || event.location.as_deref().is_some_and(location_is_online);

    let participants = event
        .attendees
        .into_iter()
        .filter_map(|a| a.email)
        .filter(|e| !e.is_empty())
        .collect();

    Some(NewMeeting {
        google_event_id: Some(event.id),
        title: event.summary.unwrap_or_else(|| "No Title".to_string()),
        start_time,
        end_time,
        is_online,
        location: event.location,
        participants,
        summary_link: None,
        is_recorded: false,
        status: MEETING_STATUS_PENDING.to_string(),
    })
}

fn location_is_online(location: &str) -> bool {
    let lowered = location.to_lowercase();
    lowered.contains("zoom") || lowered.contains("meet")
}

/// Parse a Calendar `dateTime` or all-day `date` into UTC.
///
/// Timed values without an offset are taken as UTC. All-day dates map to
/// midnight UTC.
pub fn parse_event_datetime(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if s.contains('T') {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn timed(start: &str, end: &str) -> GoogleEvent {
        GoogleEvent {
            id: "evt-1".to_string(),
            summary: Some("Planning".to_string()),
            start: Some(EventDateTime {
                date_time: Some(start.to_string()),
                date: None,
            }),
            end: Some(EventDateTime {
                date_time: Some(end.to_string()),
                date: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_offset_converts_to_utc() {
        let dt = parse_event_datetime("2025-12-10T01:00:00+05:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 12, 9, 20, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_z_suffix() {
        let dt = parse_event_datetime("2024-05-01T09:30:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let dt = parse_event_datetime("2024-05-01T09:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_event_datetime("2024-05-03").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_event_datetime("").is_none());
        assert!(parse_event_datetime("tomorrow-ish").is_none());
        assert!(parse_event_datetime("2024-13-45T99:00:00Z").is_none());
    }

    #[test]
    fn test_normalize_timed_event() {
        let mut event = timed("2024-05-01T10:00:00-04:00", "2024-05-01T11:00:00-04:00");
        event.attendees = vec![
            Attendee {
                email: Some("a@example.com".to_string()),
            },
            Attendee { email: None },
            Attendee {
                email: Some(String::new()),
            },
        ];
        let meeting = normalize_event(event, now()).unwrap();
        assert_eq!(meeting.google_event_id.as_deref(), Some("evt-1"));
        assert_eq!(meeting.title, "Planning");
        assert_eq!(
            meeting.start_time,
            Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap()
        );
        assert_eq!(
            meeting.end_time,
            Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap()
        );
        assert_eq!(meeting.participants, vec!["a@example.com"]);
        assert_eq!(meeting.status, "pending");
        assert!(!meeting.is_recorded);
        assert!(meeting.summary_link.is_none());
        assert!(!meeting.is_online);
    }

    #[test]
    fn test_normalize_skips_cancelled() {
        let mut event = timed("2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z");
        event.status = Some("cancelled".to_string());
        assert!(normalize_event(event, now()).is_none());
    }

    #[test]
    fn test_normalize_all_day() {
        let event = GoogleEvent {
            id: "allday".to_string(),
            start: Some(EventDateTime {
                date_time: None,
                date: Some("2024-05-02".to_string()),
            }),
            end: Some(EventDateTime {
                date_time: None,
                date: Some("2024-05-03".to_string()),
            }),
            ..Default::default()
        };
        let meeting = normalize_event(event, now()).unwrap();
        assert_eq!(meeting.title, "No Title");
        assert_eq!(
            meeting.start_time,
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(
            meeting.end_time,
            Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_normalize_unparseable_falls_back_to_now() {
        let event = timed("not a time", "2024-05-01T11:00:00Z");
        let meeting = normalize_event(event, now()).unwrap();
        assert_eq!(meeting.start_time, now());
        assert_eq!(meeting.end_time, now() + Duration::hours(1));
    }

    #[test]
    fn test_normalize_missing_times_falls_back_to_now() {
        let event = GoogleEvent {
            id: "bare".to_string(),
            ..Default::default()
        };
        let meeting = normalize_event(event, now()).unwrap();
        assert_eq!(meeting.start_time, now());
    }

    #[test]
    fn test_online_detection() {
        let mut conference = timed("2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z");
        conference.conference_data = Some(serde_json::json!({"conferenceId": "abc"}));
        assert!(normalize_event(conference, now()).unwrap().is_online);

        let mut zoom = timed("2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z");
        zoom.location = Some("Zoom Link: zoom.us/j/1".to_string());
        assert!(normalize_event(zoom, now()).unwrap().is_online);

        let mut meet = timed("2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z");
        meet.location = Some("https://meet.google.com/abc".to_string());
        assert!(normalize_event(meet, now()).unwrap().is_online);

        let mut room = timed("2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z");
        room.location = Some("Conference Room 3B".to_string());
        let meeting = normalize_event(room, now()).unwrap();
        assert!(!meeting.is_online);
        assert_eq!(meeting.location.as_deref(), Some("Conference Room 3B"));
    }

    #[test]
    fn test_deserialize_event_json() {
        let json = r#"{
            "id": "abc123",
            "status": "confirmed",
            "summary": "Design review",
            "location": "Zoom",
            "start": {"dateTime": "2024-05-01T15:00:00Z"},
            "end": {"dateTime": "2024-05-01T16:00:00Z"},
            "attendees": [{"email": "x@example.com", "responseStatus": "accepted"}],
            "conferenceData": {"entryPoints": []}
        }"#;
        let event: GoogleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "abc123");
        assert!(event.conference_data.is_some());
        assert_eq!(event.attendees.len(), 1);
    }
}
