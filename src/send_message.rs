use std::future::Future;
use std::time::Duration;

use log::info;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::config::Config;
use crate::types::{BotCommand, LocaleCommands, MessengerProfile, ReplyPayload, SendAck};

const START_COMMAND_DESCRIPTION: &str = "Натисність сюди щоб почати користуватися ботом";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request to send API failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("send API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not decode send API response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Delivers one reply to the chat platform. Implementations report failures
/// as `DeliveryError` and never panic; callers do not retry.
pub trait ReplySender: Send + Sync {
    fn send(
        &self,
        reply: &ReplyPayload,
    ) -> impl Future<Output = Result<SendAck, DeliveryError>> + Send;
}

/// Sends replies through the Graph API `me/messages` endpoint.
#[derive(Debug, Clone)]
pub struct GraphApiSender {
    client: Client,
    base_url: String,
    access_token: String,
}

impl GraphApiSender {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Client)?;

        Ok(GraphApiSender {
            client,
            base_url: base_url.into(),
            access_token: access_token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        Self::new(
            config.graph_api_url.clone(),
            config.page_access_token.clone(),
            config.send_timeout,
        )
    }

    /// Registers the `start` command shown in the chat composer menu.
    pub async fn register_commands(&self) -> Result<(), DeliveryError> {
        let profile = MessengerProfile {
            commands: vec![LocaleCommands {
                locale: "default",
                commands: vec![BotCommand {
                    name: "start",
                    description: START_COMMAND_DESCRIPTION,
                }],
            }],
        };

        let url = format!("{}/me/messenger_profile", self.base_url);
        self.post_json(&url, &profile).await?;
        info!("Bot commands registered.");
        Ok(())
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, DeliveryError> {
        let res = self
            .client
            .post(url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(body)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status();
        let body = res.text().await.unwrap_or_else(|_| "Unknown error".into());
        Err(DeliveryError::Status { status, body })
    }
}

impl ReplySender for GraphApiSender {
    async fn send(&self, reply: &ReplyPayload) -> Result<SendAck, DeliveryError> {
        let url = format!("{}/me/messages", self.base_url);

        let res = self.post_json(&url, reply).await?;
        let ack = res.json::<SendAck>().await.map_err(DeliveryError::Decode)?;

        info!(
            "Reply sent to {} (message id {})",
            reply.recipient.id,
            ack.message_id.as_deref().unwrap_or("unknown")
        );
        Ok(ack)
    }
}
