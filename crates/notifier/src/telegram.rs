//! Telegram Bot API delivery via `sendMessage`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{DELIVERY_TARGET, DeliveryOutcome, Notifier};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API reply is wrapped in.
#[derive(Debug, Deserialize)]
struct BotApiReply {
    ok: bool,
    description: Option<String>,
}

/// Delivers notifications to one Telegram chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    /// Full `sendMessage` URL. Contains the bot token, never log it.
    send_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a notifier for `chat_id` using the Bot API at `api_url`
    /// (normally `https://api.telegram.org`).
    pub fn new(api_url: &str, token: &str, chat_id: impl Into<String>) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            send_url: format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), token),
            chat_id: chat_id.into(),
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    async fn send(&self, message: &str) -> DeliveryOutcome {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: message,
        };

        let response = match self.client.post(&self.send_url).json(&body).send().await {
            Ok(response) => response,
            // The URL embeds the bot token
            Err(e) => return DeliveryOutcome::Failed(e.without_url().to_string()),
        };

        let status = response.status();
        let reply: Option<BotApiReply> = response.json().await.ok();

        if !status.is_success() {
            let reason = match reply.and_then(|r| r.description) {
                Some(description) => format!("Telegram API returned {status}: {description}"),
                None => format!("Telegram API returned {status}"),
            };
            return DeliveryOutcome::Failed(reason);
        }

        match reply {
            Some(BotApiReply { ok: false, description }) => DeliveryOutcome::Failed(
                description.unwrap_or_else(|| "Telegram API rejected the message".to_string()),
            ),
            _ => DeliveryOutcome::Delivered,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> DeliveryOutcome {
        let outcome = self.send(message).await;

        match &outcome {
            DeliveryOutcome::Delivered => {
                tracing::info!(chat_id = %self.chat_id, text = message, "Message delivered");
            }
            DeliveryOutcome::Failed(reason) => {
                tracing::error!(
                    target: DELIVERY_TARGET,
                    chat_id = %self.chat_id,
                    "Failed to deliver message to chat {}: {reason}",
                    self.chat_id
                );
            }
        }

        outcome
    }
}
