//! Telegram Bot API status notifier.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use courier_common::error::AppError;
use courier_common::traits::StatusNotifier;
use courier_common::types::TriggerOrigin;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse {
    pub ok: bool,
    pub description: Option<String>,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
        })
    }

    /// Point the client at a different Bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }

    /// Send a plain-text message to a chat.
    ///
    /// No parse mode: recipients and raw SMTP errors often contain `_` or `*`,
    /// which Markdown parsing would reject.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), AppError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        let result: Option<TelegramApiResponse> = serde_json::from_str(&raw).ok();

        match result {
            Some(r) if status.is_success() && r.ok => Ok(()),
            Some(r) => Err(AppError::Internal(format!(
                "Telegram sendMessage failed ({}): {}",
                status,
                r.description.unwrap_or_default()
            ))),
            None => Err(AppError::Internal(format!(
                "Telegram sendMessage failed ({}): {}",
                status, raw
            ))),
        }
    }
}

#[async_trait]
impl StatusNotifier for TelegramNotifier {
    async fn notify(&self, origin: TriggerOrigin, text: &str) {
        if let Err(e) = self.send_message(origin.0, text).await {
            tracing::warn!(chat_id = %origin, error = %e, "Status report not delivered");
        }
    }
}
