//! Calendar Sync Lambda - Copies learning-platform deadlines into Todoist.
//!
//! This Lambda runs on a schedule (EventBridge) and:
//! 1. Downloads the configured iCalendar feed
//! 2. Parses its events and to-dos
//! 3. Creates one Todoist task per entry with a due date in the window
//! 4. Returns a summary of created/skipped/failed entries

use calsync_shared::{Config, SyncReport};
use chrono::Utc;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// EventBridge scheduled event
#[derive(Debug, Deserialize)]
struct ScheduledEvent {
    #[serde(default, rename = "detail-type")]
    detail_type: String,
    /// Optional: log tasks instead of creating them
    dry_run: Option<bool>,
    /// Optional: only process the first N feed entries
    limit: Option<usize>,
}

/// Sync response
#[derive(Debug, Serialize)]
struct SyncResponse {
    summary: String,
    #[serde(flatten)]
    report: SyncReport,
}

/// Application state
struct AppState {
    secrets_client: aws_sdk_secretsmanager::Client,
}

impl AppState {
    async fn new() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            secrets_client: aws_sdk_secretsmanager::Client::new(&config),
        }
    }
}

async fn handler(
    state: Arc<AppState>,
    event: LambdaEvent<ScheduledEvent>,
) -> Result<SyncResponse, Error> {
    info!("Starting calendar sync ({})", event.payload.detail_type);

    let mut config = Config::from_env().map_err(|e| {
        error!("Refusing to sync: {}", e);
        e
    })?;
    config
        .options
        .apply_overrides(event.payload.dry_run, event.payload.limit)
        .map_err(|e| {
            error!("Refusing to sync: {}", e);
            e
        })?;

    let report = calsync_shared::run(&config, Some(&state.secrets_client), Utc::now())
        .await
        .map_err(|e| {
            error!("Calendar sync aborted: {}", e);
            e
        })?;

    if report.has_partial_failures() {
        warn!(
            "Calendar sync finished with {} failed and {} malformed entries",
            report.failed.len(),
            report.malformed.len()
        );
    }

    Ok(SyncResponse {
        summary: report.summary(),
        report,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
