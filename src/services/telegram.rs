//! Telegram Bot API notifier

use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TelegramConfig;
use crate::services::notifier::{Notification, Notifier};

const MAX_DELIVERY_ATTEMPTS: usize = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

impl NotifierError {
    /// Network errors, rate limiting and server-side failures are worth
    /// another attempt; anything else (bad token, unknown chat) is not
    pub fn is_retryable(&self) -> bool {
        match self {
            NotifierError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            NotifierError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Posts HTML-formatted notifications to a Telegram chat.
///
/// Delivery happens on a spawned task so [`Notifier::notify`] never waits on
/// the network.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(
            config.api_url.clone(),
            config.bot_token.clone(),
            config.chat_id.clone(),
            client,
        ))
    }

    pub fn with_client(
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Render a notification as a Telegram HTML message: bold title, then one
    /// escaped line per detail
    pub fn render(notification: &Notification) -> String {
        let mut text = format!("<b>{}</b>", escape_html(&notification.title));
        for line in &notification.lines {
            text.push('\n');
            text.push_str(&escape_html(line));
        }
        text
    }

    /// Deliver one message, retrying transient failures with exponential
    /// backoff
    pub async fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        let text = Self::render(notification);

        (|| async { self.send_once(&text).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(200))
                    .with_max_delay(Duration::from_secs(5))
                    .with_max_times(MAX_DELIVERY_ATTEMPTS),
            )
            .when(NotifierError::is_retryable)
            .notify(|err: &NotifierError, after: Duration| {
                debug!(error = %err, retry_in = ?after, "Telegram delivery failed, retrying");
            })
            .await
    }

    async fn send_once(&self, text: &str) -> Result<(), NotifierError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let response = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifierError::Api { status, body })
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, notification: Notification) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(kind = %notification.kind, "No async runtime available, Telegram notification dropped");
            return;
        };

        let notifier = self.clone();
        handle.spawn(async move {
            if let Err(e) = notifier.send(&notification).await {
                warn!(kind = %notification.kind, error = %e, "Failed to deliver Telegram notification");
            }
        });
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
