use serenity::builder::CreateMessage;
use serenity::http::{Http, HttpError};
use serenity::model::id::ChannelId;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Discord rejected the message. Status: {status}, Code: {code}, Response: {message}")]
    Rejected {
        status: u16,
        code: isize,
        message: String,
    },
    #[error(transparent)]
    Discord(#[from] serenity::Error),
}

/// Sink for outbound plain-text messages.
pub trait Notifier: Send + Sync {
    fn deliver(&self, content: &str) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Posts to a single Discord channel through the bot REST API.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordNotifier {
    /// `channel_id` must be non-zero.
    pub fn new(bot_token: &str, channel_id: u64) -> Self {
        Self {
            http: Arc::new(Http::new(bot_token)),
            channel_id: ChannelId::new(channel_id),
        }
    }
}

impl Notifier for DiscordNotifier {
    async fn deliver(&self, content: &str) -> Result<(), DeliveryError> {
        self.channel_id
            .send_message(&self.http, CreateMessage::new().content(content))
            .await
            .map(|_| ())
            .map_err(into_delivery_error)
    }
}

fn into_delivery_error(err: serenity::Error) -> DeliveryError {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => DeliveryError::Rejected {
            status: response.status_code.as_u16(),
            code: response.error.code,
            message: response.error.message,
        },
        other => DeliveryError::Discord(other),
    }
}
