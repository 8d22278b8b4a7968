//! iCalendar feed parsing using the icalendar crate's parser.
//!
//! A feed is checked and unfolded once; its entries are then decoded lazily.
//! A broken entry yields an `Err` item and iteration carries on with the next
//! one, while a document that cannot be read at all fails up front.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold, Component, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};

use crate::models::{CalendarEvent, Due, EntryKind};
use crate::{Error, Result};

pub const UNTITLED: &str = "Untitled event";

/// An unfolded calendar document, ready to be walked.
#[derive(Debug)]
pub struct Feed {
    unfolded: String,
}

impl Feed {
    /// Validate the document header and unfold continuation lines.
    pub fn parse(raw: &str) -> Result<Self> {
        let body = raw.trim_start_matches('\u{feff}').trim_start();
        let header = body.lines().next().unwrap_or_default().trim();
        if !header.eq_ignore_ascii_case("BEGIN:VCALENDAR") {
            return Err(Error::Format(
                "document is not an iCalendar feed (missing BEGIN:VCALENDAR)".to_string(),
            ));
        }

        Ok(Self {
            unfolded: unfold(body),
        })
    }

    /// Decode the feed's VEVENT and VTODO entries.
    pub fn entries(&self) -> Result<impl Iterator<Item = Result<CalendarEvent>> + '_> {
        let calendar = read_calendar(&self.unfolded)
            .map_err(|e| Error::Format(format!("unreadable calendar document: {}", e)))?;

        Ok(calendar
            .components
            .into_iter()
            .flat_map(|component| {
                if component.name == "VCALENDAR" {
                    component.components
                } else {
                    vec![component]
                }
            })
            .filter_map(|component| {
                let kind = if component.name == "VEVENT" {
                    EntryKind::Event
                } else if component.name == "VTODO" {
                    EntryKind::Todo
                } else {
                    return None;
                };
                Some(parse_entry(&component, kind))
            }))
    }
}

fn parse_entry(component: &Component<'_>, kind: EntryKind) -> Result<CalendarEvent> {
    let uid = text_prop(component, "UID");
    let title = text_prop(component, "SUMMARY").unwrap_or_else(|| UNTITLED.to_string());

    let due_prop = match kind {
        EntryKind::Event => component.find_prop("DTSTART"),
        EntryKind::Todo => component
            .find_prop("DUE")
            .or_else(|| component.find_prop("DTSTART")),
    };

    let due = due_prop
        .map(|prop| {
            parse_due(prop).map_err(|reason| {
                Error::Format(format!(
                    "entry '{}' (uid {}): {}",
                    title,
                    uid.as_deref().unwrap_or("-"),
                    reason
                ))
            })
        })
        .transpose()?;

    Ok(CalendarEvent {
        uid,
        kind,
        title,
        due,
        description: text_prop(component, "DESCRIPTION"),
        location: text_prop(component, "LOCATION"),
    })
}

/// TEXT escapes are already decoded by the icalendar parser.
fn text_prop(component: &Component<'_>, name: &str) -> Option<String> {
    component
        .find_prop(name)
        .map(|p| p.val.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_due(prop: &Property<'_>) -> std::result::Result<Due, String> {
    let value = DatePerhapsTime::try_from(prop)
        .map_err(|_| format!("invalid {} value '{}'", prop.name, prop.val))?;

    match value {
        DatePerhapsTime::Date(date) => Ok(Due::Date(date)),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Ok(Due::DateTime(dt)),
        // Floating times carry no zone; read them as UTC
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            Ok(Due::DateTime(naive.and_utc()))
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz: Tz = tzid
                .parse()
                .map_err(|_| format!("unknown time zone '{}'", tzid))?;
            tz.from_local_datetime(&date_time)
                .earliest()
                .map(|local| Due::DateTime(local.with_timezone(&Utc)))
                .ok_or_else(|| format!("time {} does not exist in {}", date_time, tzid))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn collect(ics: &str) -> Vec<Result<CalendarEvent>> {
        let feed = Feed::parse(ics).expect("Should accept feed");
        feed.entries().expect("Should read entries").collect()
    }

    #[test]
    fn test_parse_moodle_style_feed() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Moodle Pty Ltd//NONSGML Moodle Version 2023100900//EN\r\n\
BEGIN:VEVENT\r\n\
UID:1234@lms.example.edu\r\n\
SUMMARY:Essay due\r\n\
DESCRIPTION:Submit via Turnitin\\, 2000 words\r\n\
LOCATION:Room 4\r\n\
DTSTART:20240501T235900Z\r\n\
DTEND:20240501T235900Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:5678@lms.example.edu\r\n\
SUMMARY:Reading\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let entries: Vec<CalendarEvent> = collect(ics).into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(entries.len(), 2);

        let essay = &entries[0];
        assert_eq!(essay.uid.as_deref(), Some("1234@lms.example.edu"));
        assert_eq!(essay.kind, EntryKind::Event);
        assert_eq!(essay.title, "Essay due");
        assert_eq!(
            essay.due,
            Some(Due::DateTime(Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap()))
        );
        assert_eq!(essay.description.as_deref(), Some("Submit via Turnitin, 2000 words"));
        assert_eq!(essay.location.as_deref(), Some("Room 4"));

        let reading = &entries[1];
        assert_eq!(reading.title, "Reading");
        assert_eq!(reading.due, None);
    }

    #[test]
    fn test_all_day_and_zoned_times() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:all-day
SUMMARY:Field trip
DTSTART;VALUE=DATE:20240510
END:VEVENT
BEGIN:VEVENT
UID:zoned
SUMMARY:Quiz closes
DTSTART;TZID=America/New_York:20240115T100000
END:VEVENT
BEGIN:VEVENT
UID:floating
SUMMARY:Lab report
DTSTART:20240301T120000
END:VEVENT
END:VCALENDAR"#;

        let entries: Vec<CalendarEvent> = collect(ics).into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(
            entries[0].due,
            Some(Due::Date(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()))
        );
        // EST is UTC-5 in January
        assert_eq!(
            entries[1].due,
            Some(Due::DateTime(Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()))
        );
        assert_eq!(
            entries[2].due,
            Some(Due::DateTime(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_todo_uses_due_property() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VTODO
UID:todo-1
SUMMARY:Problem set 3
DTSTART:20240401T090000Z
DUE:20240408T170000Z
END:VTODO
END:VCALENDAR"#;

        let entries: Vec<CalendarEvent> = collect(ics).into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Todo);
        assert_eq!(
            entries[0].due,
            Some(Due::DateTime(Utc.with_ymd_and_hms(2024, 4, 8, 17, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_todo_without_due_falls_back_to_dtstart() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VTODO
UID:todo-2
SUMMARY:Group meeting notes
DTSTART;VALUE=DATE:20240415
END:VTODO
END:VCALENDAR"#;

        let entries: Vec<CalendarEvent> = collect(ics).into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(entries[0].kind, EntryKind::Todo);
        assert_eq!(
            entries[0].due,
            Some(Due::Date(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()))
        );
    }

    #[test]
    fn test_malformed_entry_does_not_stop_the_rest() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:bad-zone
SUMMARY:Seminar
DTSTART;TZID=Mars/Olympus_Mons:20240115T100000
END:VEVENT
BEGIN:VEVENT
UID:good
SUMMARY:Exam
DTSTART:20240620T090000Z
END:VEVENT
END:VCALENDAR"#;

        let entries = collect(ics);
        assert_eq!(entries.len(), 2);
        match &entries[0] {
            Err(Error::Format(msg)) => assert!(msg.contains("Seminar"), "{}", msg),
            other => panic!("Expected format error, got {:?}", other),
        }
        assert_eq!(entries[1].as_ref().unwrap().title, "Exam");
    }

    #[test]
    fn test_missing_summary_gets_default_title() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:nameless
DTSTART:20240620T090000Z
END:VEVENT
END:VCALENDAR"#;

        let entries = collect(ics);
        assert_eq!(entries[0].as_ref().unwrap().title, UNTITLED);
    }

    #[test]
    fn test_rejects_non_calendar_documents() {
        let html = "<!DOCTYPE html><html><body>Please log in</body></html>";
        assert!(matches!(Feed::parse(html), Err(Error::Format(_))));
        assert!(matches!(Feed::parse(""), Err(Error::Format(_))));
    }

    #[test]
    fn test_empty_calendar_has_no_entries() {
        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nEND:VCALENDAR\n";
        assert!(collect(ics).is_empty());
    }

    #[test]
    fn test_literal_backslashes_survive_parsing() {
        let ics = r"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:path
SUMMARY:Copy to C:\\temp\\new
DTSTART:20240620T090000Z
END:VEVENT
END:VCALENDAR";

        let entries = collect(ics);
        assert_eq!(entries[0].as_ref().unwrap().title, r"Copy to C:\temp\new");
    }
}
