//! Calendar feed download.

use reqwest::Url;
use tracing::info;

use crate::http::error_body;
use crate::{Error, Result};

/// Download the calendar document with a single GET.
///
/// Feed URLs usually embed an access token, so only the host is logged and
/// the URL is stripped from transport errors.
pub async fn fetch_calendar(client: &reqwest::Client, url: &Url) -> Result<String> {
    let host = url.host_str().unwrap_or("<unknown host>");
    info!("Fetching calendar feed from {}", host);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::Network(format!("Calendar request failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        let body = error_body(response).await;
        return Err(Error::Network(format!(
            "Calendar feed returned {}: {}",
            status, body
        )));
    }

    let text = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("Failed to read calendar body: {}", e.without_url())))?;

    info!("Fetched {} bytes of calendar data", text.len());
    Ok(text)
}
