// # Telegram Notifier
//
// Announces IP changes through a Telegram bot.
//
// ## API
//
// ```http
// POST https://api.telegram.org/bot{api_key}/sendMessage
// Content-Type: application/json
//
// {"chat_id": "123456", "text": "1.2.3.4 moved to 5.6.7.8"}
// ```
//
// The Bot API always answers with `{"ok": bool, ...}`; failures carry
// `error_code` and `description`.
//
// ## Security
//
// The bot key is part of the request URL, so transport errors are stripped
// of their URL before they are formatted. The key never reaches logs or
// Debug output.

use iprefresher_core::traits::Notifier;
use iprefresher_core::{Error, MessagingCredentials, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Substring present in Bot API error bodies
const ERROR_MARKER: &str = "\"error_code\"";

/// Telegram bot notifier
pub struct TelegramNotifier {
    /// Bot API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Chat the messages go to
    chat_id: String,

    api_base: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the bot key
impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_key", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotReply {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    /// Create a new notifier
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key or chat id is empty.
    pub fn new(api_key: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let chat_id = chat_id.into();

        if api_key.is_empty() || chat_id.is_empty() {
            return Err(Error::config("Telegram API key and chat id are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            chat_id,
            api_base: TELEGRAM_API_BASE.to_string(),
            client,
        })
    }

    /// Create a notifier from the messaging part of the config
    pub fn from_credentials(credentials: &MessagingCredentials) -> Result<Self> {
        Self::new(credentials.api_key.clone(), credentials.chat_id.clone())
    }

    /// Send requests to `api_base` instead of api.telegram.org
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Chat the notifier posts to
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.api_key)
    }
}

/// Decide whether a Bot API answer means the message was delivered
fn interpret_reply(status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<BotReply>(body) {
        Ok(reply) if reply.ok && status.is_success() => Ok(()),
        Ok(reply) => {
            let code = reply.error_code.unwrap_or(status.as_u16());
            let description = reply.description.unwrap_or_else(|| "no description".to_string());
            match code {
                401 | 403 => Err(Error::auth(format!("Telegram: {} ({})", description, code))),
                429 => Err(Error::rate_limited(format!("Telegram: {}", description))),
                _ => Err(Error::notification(format!(
                    "Telegram error {}: {}",
                    code, description
                ))),
            }
        }
        Err(_) if !status.is_success() || body.contains(ERROR_MARKER) => Err(
            Error::notification(format!("Telegram answered HTTP {} with an error", status)),
        ),
        Err(_) => Ok(()),
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message,
        };

        let response = self
            .client
            .post(self.send_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("Telegram request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::http(format!("Failed to read Telegram response: {}", e.without_url()))
        })?;

        interpret_reply(status, &body)?;

        tracing::debug!("Telegram message delivered to chat {}", self.chat_id);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "telegram"
    }
}
