use crate::notify::Notifier;
use crate::responder::StatusResponder;
use crate::source::FacilityApi;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const PING: u8 = 1;
const APPLICATION_COMMAND: u8 = 2;

const PONG: u8 = 1;
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;

#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<CommandData>,
}

#[derive(Debug, Deserialize)]
pub struct CommandData {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseData {
    pub content: String,
}

impl InteractionResponse {
    fn pong() -> Self {
        Self {
            kind: PONG,
            data: None,
        }
    }

    fn message(content: impl Into<String>) -> Self {
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(ResponseData {
                content: content.into(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("unsupported interaction type {0}")]
    UnsupportedType(u8),
    #[error("application command without data")]
    MissingData,
}

impl IntoResponse for InteractionError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejected interaction");
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

pub struct InteractionState<A, N> {
    responder: Arc<StatusResponder<A, N>>,
    command_name: Arc<str>,
}

impl<A, N> Clone for InteractionState<A, N> {
    fn clone(&self) -> Self {
        Self {
            responder: Arc::clone(&self.responder),
            command_name: Arc::clone(&self.command_name),
        }
    }
}

pub fn router<A, N>(responder: Arc<StatusResponder<A, N>>, command_name: &str) -> Router
where
    A: FacilityApi + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/interactions", post(handle_interaction::<A, N>))
        .with_state(InteractionState {
            responder,
            command_name: Arc::from(command_name),
        })
}

pub async fn serve_interactions(router: Router, addr: &str, shutdown: CancellationToken) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "listening for interactions");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await
}

async fn handle_interaction<A, N>(
    State(state): State<InteractionState<A, N>>,
    Json(interaction): Json<Interaction>,
) -> Result<Json<InteractionResponse>, InteractionError>
where
    A: FacilityApi + 'static,
    N: Notifier + 'static,
{
    match interaction.kind {
        PING => Ok(Json(InteractionResponse::pong())),
        APPLICATION_COMMAND => {
            let data = interaction.data.ok_or(InteractionError::MissingData)?;
            if data.name != *state.command_name {
                debug!(command = %data.name, "ignoring unknown command");
                return Ok(Json(InteractionResponse::message(format!(
                    "Unknown command `{}`",
                    data.name
                ))));
            }
            let reply = state.responder.respond().await;
            Ok(Json(InteractionResponse::message(reply.content())))
        }
        other => Err(InteractionError::UnsupportedType(other)),
    }
}
