//! Turns feed entries into task requests.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::models::{CalendarEvent, Due, TaskRequest};

/// Span of due dates worth syncing, relative to the invocation start.
///
/// `None` on either side leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncWindow {
    pub past: Option<TimeDelta>,
    pub future: Option<TimeDelta>,
}

impl SyncWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounds that fall outside chrono's representable range are open.
    pub fn contains(&self, due: &Due, now: DateTime<Utc>) -> bool {
        let after_start = match self.past.and_then(|past| now.checked_sub_signed(past)) {
            Some(start) => match due {
                // An all-day due is still live for the whole of its day
                Due::Date(_) => due
                    .starts_at()
                    .checked_add_signed(TimeDelta::days(1))
                    .map_or(true, |day_end| day_end > start),
                Due::DateTime(dt) => *dt >= start,
            },
            None => true,
        };
        let before_end = match self.future.and_then(|future| now.checked_add_signed(future)) {
            Some(end) => due.starts_at() <= end,
            None => true,
        };
        after_start && before_end
    }
}

/// Why an entry produced no task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoDueDate,
    OutsideWindow,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoDueDate => f.write_str("no due date"),
            SkipReason::OutsideWindow => f.write_str("due outside sync window"),
        }
    }
}

/// Everything the mapper needs besides the entry itself.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub project_id: &'a str,
    pub window: SyncWindow,
    pub uid_marker: &'a str,
    pub now: DateTime<Utc>,
}

/// Map one calendar entry to its task request.
pub fn map_event(
    event: &CalendarEvent,
    ctx: &MapContext<'_>,
) -> std::result::Result<TaskRequest, SkipReason> {
    let due = event.due.ok_or(SkipReason::NoDueDate)?;
    if !ctx.window.contains(&due, ctx.now) {
        return Err(SkipReason::OutsideWindow);
    }

    Ok(TaskRequest {
        title: event.title.clone(),
        due,
        project_id: ctx.project_id.to_string(),
        description: task_description(event, ctx.uid_marker),
    })
}

/// Location, description and the UID marker, one block per line.
fn task_description(event: &CalendarEvent, marker: &str) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(location) = &event.location {
        parts.push(format!("@{}", location));
    }
    if let Some(description) = &event.description {
        parts.push(description.clone());
    }
    if let Some(uid) = &event.uid {
        parts.push(format!("{}{}", marker, uid));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}
