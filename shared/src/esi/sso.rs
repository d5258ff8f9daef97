use crate::config::SsoConfig;
use crate::esi::read_failure;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use tracing::debug;

/// Short-lived bearer token issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Error)]
pub enum SsoError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("failed to refresh access token. Status: {status}, Response: {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchanges the stored refresh token for a fresh access token.
pub async fn refresh_access_token(
    client: &Client,
    config: &SsoConfig,
) -> Result<AccessToken, SsoError> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", config.refresh_token.expose()),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.expose()),
    ];

    let resp = client.post(&config.token_url).form(&params).send().await?;
    if !resp.status().is_success() {
        let (status, body) = read_failure(resp).await;
        return Err(SsoError::Rejected { status, body });
    }

    let tokens = resp.json::<TokenResponse>().await?;
    debug!(expires_in = ?tokens.expires_in, "refreshed SSO access token");
    Ok(AccessToken(tokens.access_token))
}
