//! Outbound port to the notification bot.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use taskboard_types::notify::{DispatchMessage, NoticeKind};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatcher unreachable: {0}")]
    Transport(String),

    #[error("Dispatcher answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Delivers one text message to one chat. Failures are reported, never retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(
        &self,
        kind: NoticeKind,
        chat_id: i64,
        text: &str,
    ) -> Result<(), DispatchError>;
}

/// Posts `{chat_id, text}` to the bot relay.
pub struct HttpNotifier {
    http: reqwest::Client,
    base_url: String,
}

impl HttpNotifier {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building dispatcher HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn deliver(
        &self,
        kind: NoticeKind,
        chat_id: i64,
        text: &str,
    ) -> Result<(), DispatchError> {
        let url = format!("{}/{}", self.base_url, kind.path());
        let body = DispatchMessage {
            chat_id,
            text: text.to_string(),
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(chat_id, path = kind.path(), "Notification delivered");
        Ok(())
    }
}
