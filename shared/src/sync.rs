//! One sync invocation: fetch → parse → map → submit.

use aws_sdk_secretsmanager::Client as SecretsClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{ApiToken, Config};
use crate::error::ServiceErrorKind;
use crate::fetch::fetch_calendar;
use crate::http::build_client;
use crate::ics::Feed;
use crate::mapper::{map_event, MapContext, SkipReason};
use crate::models::{Due, TaskRequest};
use crate::secrets::resolve_token;
use crate::todoist::TodoistClient;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub title: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedEntry {
    pub title: String,
    pub due: Due,
    pub kind: ServiceErrorKind,
    pub reason: String,
}

/// Outcome of a run that got as far as reading the feed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub entries_seen: usize,
    pub created: usize,
    pub planned: usize,
    pub skipped: Vec<SkippedEntry>,
    pub failed: Vec<FailedEntry>,
    pub malformed: Vec<String>,
}

impl SyncReport {
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Created={}, Skipped={}, Failed={}, Malformed={}",
            self.created,
            self.skipped.len(),
            self.failed.len(),
            self.malformed.len()
        );
        if self.dry_run {
            line.push_str(&format!(", Planned={} (dry run)", self.planned));
        }
        line
    }

    /// Whether any entry could not be turned into a task.
    pub fn has_partial_failures(&self) -> bool {
        !self.failed.is_empty() || !self.malformed.is_empty()
    }
}

/// Resolve credentials and run one sync.
pub async fn run(
    config: &Config,
    secrets: Option<&SecretsClient>,
    now: DateTime<Utc>,
) -> Result<SyncReport> {
    let token = resolve_token(&config.token, secrets).await?;
    let http = build_client(config.http_timeout)?;
    sync_feed(config, token, &http, now).await
}

/// Run one sync with an already resolved token.
///
/// Fetch and document-level parse failures abort; per-entry problems are
/// recorded in the report and the run moves on.
pub async fn sync_feed(
    config: &Config,
    token: ApiToken,
    http: &reqwest::Client,
    now: DateTime<Utc>,
) -> Result<SyncReport> {
    let options = &config.options;
    let raw = fetch_calendar(http, &config.calendar_url).await?;
    let feed = Feed::parse(&raw)?;
    let entries = feed.entries()?;

    let todoist = TodoistClient::new(http.clone(), &config.api_base, token);
    let ctx = MapContext {
        project_id: &config.project_id,
        window: options.window,
        uid_marker: &options.uid_marker,
        now,
    };

    let mut report = SyncReport {
        dry_run: options.dry_run,
        ..SyncReport::default()
    };

    for entry in entries.take(options.limit.unwrap_or(usize::MAX)) {
        report.entries_seen += 1;

        let event = match entry {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed entry: {}", e);
                report.malformed.push(e.to_string());
                continue;
            }
        };

        let request = match map_event(&event, &ctx) {
            Ok(request) => request,
            Err(reason) => {
                info!("Skipping '{}': {}", event.title, reason);
                report.skipped.push(SkippedEntry {
                    title: event.title,
                    reason,
                });
                continue;
            }
        };

        if options.dry_run {
            info!(
                "[dry run] Would create task '{}' due {} in project {}",
                request.title, request.due, request.project_id
            );
            report.planned += 1;
            continue;
        }

        submit(&todoist, request, &mut report).await;
    }

    if report.entries_seen == 0 {
        info!("Calendar feed has no entries; nothing to sync");
    }

    info!("Calendar sync complete: {}", report.summary());
    Ok(report)
}

async fn submit(todoist: &TodoistClient, request: TaskRequest, report: &mut SyncReport) {
    match todoist.create_task(&request).await {
        Ok(_) => report.created += 1,
        Err(Error::Service { kind, message }) => {
            error!("Failed to create task '{}': {}", request.title, message);
            report.failed.push(FailedEntry {
                title: request.title,
                due: request.due,
                kind,
                reason: message,
            });
        }
        Err(e) => {
            error!("Failed to create task '{}': {}", request.title, e);
            report.failed.push(FailedEntry {
                title: request.title,
                due: request.due,
                kind: ServiceErrorKind::Transport,
                reason: e.to_string(),
            });
        }
    }
}
