//! AWS Secrets Manager integration for the Todoist token.

use aws_sdk_secretsmanager::Client as SecretsClient;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::{ApiToken, TokenSource};
use crate::{Error, Result};

/// Cached secrets, kept across invocations of a warm Lambda.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    // Check cache first
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

/// Extract the token from a secret payload.
///
/// Accepts either the bare token or a JSON object with a `token`,
/// `todoist_token` or `api_token` field.
pub fn token_from_secret(secret: &str) -> Result<ApiToken> {
    let trimmed = secret.trim();
    if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed)?;
        return ["token", "todoist_token", "api_token"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ApiToken::new)
            .ok_or_else(|| Error::Config("Token secret has no token field".to_string()));
    }

    if trimmed.is_empty() {
        return Err(Error::Config("Token secret is empty".to_string()));
    }
    Ok(ApiToken::new(trimmed))
}

/// Resolve the configured token source to a usable token.
///
/// Inline tokens never touch the network; a secret ARN needs a client.
pub async fn resolve_token(
    source: &TokenSource,
    client: Option<&SecretsClient>,
) -> Result<ApiToken> {
    match source {
        TokenSource::Inline(token) => Ok(token.clone()),
        TokenSource::SecretArn(arn) => {
            let client = client.ok_or_else(|| {
                Error::Config("TODOIST_TOKEN_SECRET_ARN set but no Secrets Manager client".to_string())
            })?;
            info!("Resolving Todoist token from Secrets Manager");
            let secret = get_secret(client, arn).await?;
            token_from_secret(&secret)
        }
    }
}
