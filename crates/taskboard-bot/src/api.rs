//! Client for the task server's bot-facing endpoints.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use taskboard_types::notify::ChatHandle;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

impl ApiError {
    /// The server did not recognise the handle.
    pub fn is_unknown_user(&self) -> bool {
        matches!(self, ApiError::Server { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_handle(&self, path: &str, handle: &ChatHandle) -> Result<(), ApiError> {
        let resp = self.client.post(self.url(path)).json(handle).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "server error".to_string(),
        };
        Err(ApiError::Server { status, message })
    }

    /// Stores `chat_id` on the account whose Telegram name or username is `tg_name`.
    pub async fn link_chat(&self, tg_name: &str, chat_id: i64) -> Result<(), ApiError> {
        self.post_handle(
            "/add-chat-id",
            &ChatHandle {
                tg_name: tg_name.to_string(),
                chat_id,
            },
        )
        .await
    }

    /// Asks the server to push the task digest to `chat_id`.
    pub async fn send_tasks(&self, tg_name: &str, chat_id: i64) -> Result<(), ApiError> {
        self.post_handle(
            "/send-tasks",
            &ChatHandle {
                tg_name: tg_name.to_string(),
                chat_id,
            },
        )
        .await
    }
}
