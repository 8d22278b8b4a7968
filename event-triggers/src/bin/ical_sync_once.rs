//! Run a single calendar sync from the local shell.
//!
//! Reads the same environment variables as the Lambda and prints the report.

use anyhow::Context;
use calsync_shared::{Config, TokenSource};
use chrono::Utc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let secrets_client = match config.token {
        TokenSource::SecretArn(_) => {
            let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Some(aws_sdk_secretsmanager::Client::new(&aws))
        }
        TokenSource::Inline(_) => None,
    };

    let report = calsync_shared::run(&config, secrets_client.as_ref(), Utc::now())
        .await
        .context("Calendar sync failed")?;

    println!("Done. {}", report.summary());
    for failed in &report.failed {
        println!("  failed: '{}' due {} ({}): {}", failed.title, failed.due, failed.kind, failed.reason);
    }
    for malformed in &report.malformed {
        println!("  malformed: {}", malformed);
    }

    Ok(())
}
