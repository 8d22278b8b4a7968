//! HTTP helpers shared by the feed fetcher and the Todoist client.

use std::time::Duration;

use crate::{Error, Result};

const USER_AGENT: &str = concat!("calsync/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for one invocation.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Read an error body for logging, capped so a full HTML page stays out of the logs.
pub async fn error_body(response: reqwest::Response) -> String {
    let mut text = response.text().await.unwrap_or_default();
    if text.len() > 200 {
        let mut cut = 200;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
