//! Shared library for the calendar-to-Todoist sync Lambda.
//!
//! This crate holds the whole sync pipeline; the binaries in `event-triggers`
//! only wire it to the Lambda runtime or a local shell.

pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod ics;
pub mod mapper;
pub mod models;
pub mod secrets;
pub mod sync;
pub mod todoist;

pub use config::{ApiToken, Config, SyncOptions, TokenSource};
pub use error::{Error, Result, ServiceErrorKind};
pub use ics::Feed;
pub use mapper::{map_event, MapContext, SkipReason, SyncWindow};
pub use models::{CalendarEvent, CreatedTask, Due, EntryKind, TaskRequest};
pub use secrets::{get_secret, resolve_token};
pub use sync::{run, sync_feed, FailedEntry, SkippedEntry, SyncReport};
pub use todoist::TodoistClient;
