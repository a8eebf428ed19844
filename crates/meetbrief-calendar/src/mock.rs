//! Demo schedule used by the `mock` sync source.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;

use meetbrief_core::types::NewMeeting;

struct MockSlot {
    title: &'static str,
    start_offset: Duration,
    length: Duration,
    is_online: bool,
    location: &'static str,
    participants: &'static [&'static str],
    summary_link: Option<&'static str>,
    is_recorded: bool,
    status: &'static str,
}

fn slots() -> [MockSlot; 4] {
    [
        MockSlot {
            title: "Daily Standup",
            start_offset: Duration::zero(),
            length: Duration::minutes(30),
            is_online: true,
            location: "Zoom Link: zoom.us/j/12345",
            participants: &["sarah@example.com", "john@example.com"],
            summary_link: Some("https://granola.com/summary/m-0-1"),
            is_recorded: true,
            status: "pending",
        },
        MockSlot {
            title: "Client Pitch - Project Alpha",
            start_offset: Duration::hours(2),
            length: Duration::hours(1),
            is_online: true,
            location: "Google Meet: meet.google.com/abc-defg-hij",
            participants: &["sarah@example.com", "client@example.com"],
            summary_link: None,
            is_recorded: false,
            status: "unrecorded",
        },
        MockSlot {
            title: "Team Brainstorm Session",
            start_offset: Duration::hours(5),
            length: Duration::minutes(90),
            is_online: false,
            location: "Conference Room 3B",
            participants: &["sarah@example.com", "mark@example.com", "lisa@example.com"],
            summary_link: None,
            is_recorded: false,
            status: "offline-pending-input",
        },
        MockSlot {
            title: "1:1 with John",
            start_offset: Duration::hours(7),
            length: Duration::minutes(30),
            is_online: true,
            location: "Zoom Link: zoom.us/j/67890",
            participants: &["sarah@example.com", "john@example.com"],
            summary_link: Some("https://notion.so/summary/m-0-4"),
            is_recorded: true,
            status: "processed",
        },
    ]
}

/// Four sample meetings on `now`'s calendar day, starting at 09:00 in
/// `now`'s timezone. Event ids are random `evt_NNNN` values.
pub fn mock_meetings<Tz: TimeZone>(now: DateTime<Tz>) -> Vec<NewMeeting> {
    let day_start = now
        .date_naive()
        .and_hms_opt(9, 0, 0)
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc));

    let mut rng = rand::rng();
    slots()
        .into_iter()
        .map(|slot| {
            let start_time = day_start + slot.start_offset;
            NewMeeting {
                google_event_id: Some(format!("evt_{}", rng.random_range(1000..=9999))),
                title: slot.title.to_string(),
                start_time,
                end_time: start_time + slot.length,
                is_online: slot.is_online,
                location: Some(slot.location.to_string()),
                participants: slot.participants.iter().map(|p| p.to_string()).collect(),
                summary_link: slot.summary_link.map(str::to_string),
                is_recorded: slot.is_recorded,
                status: slot.status.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_four_meetings_in_order() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 15, 42, 0).unwrap();
        let meetings = mock_meetings(now);
        let titles: Vec<&str> = meetings.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Daily Standup",
                "Client Pitch - Project Alpha",
                "Team Brainstorm Session",
                "1:1 with John"
            ]
        );
        let nine = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        assert_eq!(meetings[0].start_time, nine);
        assert_eq!(meetings[0].end_time, nine + Duration::minutes(30));
        assert_eq!(meetings[1].start_time, nine + Duration::hours(2));
        assert_eq!(meetings[2].end_time, nine + Duration::minutes(390));
        assert_eq!(meetings[3].end_time, nine + Duration::minutes(450));
    }

    #[test]
    fn test_statuses_and_flags() {
        let meetings = mock_meetings(Utc::now());
        let statuses: Vec<&str> = meetings.iter().map(|m| m.status.as_str()).collect();
        assert_eq!(
            statuses,
            vec!["pending", "unrecorded", "offline-pending-input", "processed"]
        );
        assert!(meetings[0].is_recorded && meetings[0].summary_link.is_some());
        assert!(!meetings[2].is_online);
        assert_eq!(meetings[2].participants.len(), 3);
    }

    #[test]
    fn test_event_ids_shape() {
        for meeting in mock_meetings(Utc::now()) {
            let id = meeting.google_event_id.unwrap();
            let digits = id.strip_prefix("evt_").unwrap();
            let n: u32 = digits.parse().unwrap();
            assert!((1000..=9999).contains(&n));
        }
    }

    #[test]
    fn test_anchored_in_callers_timezone() {
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let meetings = mock_meetings(now);
        // 09:00 at UTC+5 is 04:00 UTC.
        assert_eq!(
            meetings[0].start_time,
            Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0).unwrap()
        );
    }
}
