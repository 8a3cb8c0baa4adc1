//! Telegram Bot API client and the Notifier built on it.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::ports::{Notifier, NotifyError};
use super::types::{ApiResponse, SendMessage, Update};

/// Extra time allowed on top of the long-poll timeout
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Telegram API error: {0}")]
    ApiError(String),
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    /// Long-poll timeout for getUpdates
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    config: TelegramConfig,
    http: Client,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(config.poll_timeout + POLL_GRACE)
            .build()?;
        Ok(Self { config, http })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let payload = SendMessage {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;

        let body: ApiResponse<serde_json::Value> = response.json().await?;
        Self::unwrap_response(body).map(|_| ())
    }

    /// Long-poll for new updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let response = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.config.poll_timeout.as_secs().to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .send()
            .await?;

        let body: ApiResponse<Vec<Update>> = response.json().await?;
        Self::unwrap_response(body)
    }

    fn unwrap_response<T: DeserializeOwned>(body: ApiResponse<T>) -> Result<T, TelegramError> {
        if !body.ok {
            return Err(TelegramError::ApiError(
                body.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        body.result
            .ok_or_else(|| TelegramError::ApiError("response without result".to_string()))
    }
}

/// Sends change notifications to one fixed chat
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            chat_id: chat_id.into(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        match self.client.send_message(&self.chat_id, text).await {
            Ok(()) => {
                tracing::debug!("Telegram notification sent to {}", self.chat_id);
                Ok(())
            }
            Err(TelegramError::HttpError(e)) => Err(NotifyError::Transport(e.to_string())),
            Err(TelegramError::ApiError(msg)) => Err(NotifyError::Rejected(msg)),
        }
    }
}
