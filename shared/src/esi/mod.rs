//! Clients for EVE's identity provider (SSO) and the ESI REST API.

pub mod api;
pub mod sso;

pub use api::{CharacterDto, EsiClient, StructureDto};
pub use sso::{AccessToken, SsoError};

use reqwest::{Response, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EsiError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("ESI request to {url} failed. Status: {status}, Response: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("ESI returned an unreadable X-Pages header: {0:?}")]
    Pages(String),
}

/// Drains a non-success response into its status and body text.
pub(crate) async fn read_failure(resp: Response) -> (StatusCode, String) {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    (status, body)
}
