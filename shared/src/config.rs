//! Configuration management for the sync job.
//!
//! Everything is read from environment variables once, at the start of an
//! invocation, and handed to the components as an explicit [`Config`] value.

use std::env;
use std::fmt;
use std::time::Duration;

use chrono::TimeDelta;
use reqwest::Url;

use crate::mapper::SyncWindow;
use crate::{Error, Result};

pub const DEFAULT_TODOIST_API_BASE: &str = "https://api.todoist.com/rest/v2";
pub const DEFAULT_UID_MARKER: &str = "ICUID:";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
/// Largest accepted SYNC_PAST_DAYS / SYNC_FUTURE_DAYS (about 100 years).
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Bearer token for the task service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// Where the task-service token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Token given directly in `TODOIST_API_TOKEN`
    Inline(ApiToken),
    /// ARN of a Secrets Manager secret holding the token
    SecretArn(String),
}

/// Knobs that shape a run without changing what gets synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub window: SyncWindow,
    pub uid_marker: String,
}

impl SyncOptions {
    /// Apply per-invocation overrides from a trigger payload.
    pub fn apply_overrides(&mut self, dry_run: Option<bool>, limit: Option<usize>) -> Result<()> {
        if limit == Some(0) {
            return Err(Error::Config("limit must be positive".to_string()));
        }
        if let Some(dry_run) = dry_run {
            self.dry_run = dry_run;
        }
        if limit.is_some() {
            self.limit = limit;
        }
        Ok(())
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            limit: None,
            window: SyncWindow::unbounded(),
            uid_marker: DEFAULT_UID_MARKER.to_string(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Calendar feed URL, already normalized to http(s)
    pub calendar_url: Url,
    /// Target Todoist project
    pub project_id: String,
    /// Todoist token or where to find it
    pub token: TokenSource,
    /// Todoist REST API base URL
    pub api_base: Url,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    pub options: SyncOptions,
}

// Feed URLs embed an access token, so only scheme and host are shown.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feed = format!(
            "{}://{}/<redacted>",
            self.calendar_url.scheme(),
            self.calendar_url.host_str().unwrap_or_default()
        );
        f.debug_struct("Config")
            .field("calendar_url", &feed)
            .field("project_id", &self.project_id)
            .field("token", &self.token)
            .field("api_base", &self.api_base.as_str())
            .field("http_timeout", &self.http_timeout)
            .field("options", &self.options)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| Error::Config(format!("{} not set", key)));

        let calendar_url = parse_calendar_url(&require("ICAL_URL")?)?;
        let project_id = require("TODOIST_PROJECT_ID")?;

        let token = match (get("TODOIST_API_TOKEN"), get("TODOIST_TOKEN_SECRET_ARN")) {
            (Some(token), _) => TokenSource::Inline(ApiToken::new(token)),
            (None, Some(arn)) => TokenSource::SecretArn(arn),
            (None, None) => {
                return Err(Error::Config(
                    "TODOIST_API_TOKEN or TODOIST_TOKEN_SECRET_ARN must be set".to_string(),
                ))
            }
        };

        let api_base = get("TODOIST_API_BASE").unwrap_or_else(|| DEFAULT_TODOIST_API_BASE.to_string());
        let api_base = Url::parse(&api_base)
            .map_err(|e| Error::Config(format!("Invalid TODOIST_API_BASE: {}", e)))?;

        let http_timeout = Duration::from_secs(
            parse_opt::<u64>(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        let limit = parse_opt::<usize>(get("SYNC_LIMIT"), "SYNC_LIMIT")?;
        if limit == Some(0) {
            return Err(Error::Config("SYNC_LIMIT must be positive".to_string()));
        }

        let window = SyncWindow {
            past: parse_window_days(get("SYNC_PAST_DAYS"), "SYNC_PAST_DAYS")?,
            future: parse_window_days(get("SYNC_FUTURE_DAYS"), "SYNC_FUTURE_DAYS")?,
        };

        let options = SyncOptions {
            dry_run: parse_bool(get("SYNC_DRY_RUN"), "SYNC_DRY_RUN")?.unwrap_or(false),
            limit,
            window,
            uid_marker: get("SYNC_UID_MARKER").unwrap_or_else(|| DEFAULT_UID_MARKER.to_string()),
        };

        Ok(Self {
            calendar_url,
            project_id,
            token,
            api_base,
            http_timeout,
            options,
        })
    }
}

/// Parse the feed URL, rewriting `webcal://` to `https://`.
pub fn parse_calendar_url(raw: &str) -> Result<Url> {
    let rewritten = match raw.strip_prefix("webcal://") {
        Some(rest) => format!("https://{}", rest),
        None => raw.to_string(),
    };

    let url = Url::parse(&rewritten)
        .map_err(|e| Error::Config(format!("Invalid ICAL_URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "Unsupported ICAL_URL scheme: {}",
            other
        ))),
    }
}

fn parse_opt<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, v)))
        })
        .transpose()
}

fn parse_window_days(value: Option<String>, key: &str) -> Result<Option<TimeDelta>> {
    match parse_opt::<u32>(value, key)? {
        Some(days) if days > MAX_WINDOW_DAYS => Err(Error::Config(format!(
            "{} must be at most {} days, got {}",
            key, MAX_WINDOW_DAYS, days
        ))),
        days => Ok(days.map(|d| TimeDelta::days(i64::from(d)))),
    }
}

fn parse_bool(value: Option<String>, key: &str) -> Result<Option<bool>> {
    value
        .map(|v| match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::Config(format!("{} has an invalid value: {}", key, v))),
        })
        .transpose()
}
