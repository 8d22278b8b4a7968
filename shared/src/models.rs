//! Shared data models.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Serialize, Serializer};

/// When a task falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Due {
    /// All-day deadline
    Date(NaiveDate),
    /// Exact instant
    DateTime(DateTime<Utc>),
}

impl Due {
    /// Earliest instant covered by this due value.
    pub fn starts_at(&self) -> DateTime<Utc> {
        match self {
            Due::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
            Due::DateTime(dt) => *dt,
        }
    }
}

impl std::fmt::Display for Due {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Due::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Due::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
        }
    }
}

impl Serialize for Due {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which iCalendar component an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Event,
    Todo,
}

/// One entry of the calendar feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: Option<String>,
    pub kind: EntryKind,
    pub title: String,
    pub due: Option<Due>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// A task the sync wants created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRequest {
    pub title: String,
    pub due: Due,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Task as returned by the Todoist create call.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreatedTask {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}
