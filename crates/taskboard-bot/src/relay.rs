//! HTTP relay the task server posts notifications to.
//!
//! Both endpoints take a [`DispatchMessage`] and push its text to the given
//! chat through a [`MessageSink`]. The paths only differ for logging.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use taskboard_types::notify::{DispatchMessage, NoticeKind};
use teloxide::prelude::*;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Where relayed text ends up.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SinkError>;
}

pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SinkError> {
        self.bot
            .send_message(ChatId(chat_id), text.to_string())
            .await
            .map(|_| ())
            .map_err(|e| SinkError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid request body: {0}")]
    BadBody(String),

    #[error("Message text is empty")]
    EmptyText,

    #[error("Delivery failed: {0}")]
    Sink(#[from] SinkError),
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        RelayError::BadBody(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::BadBody(_) | RelayError::EmptyText => StatusCode::BAD_REQUEST,
            RelayError::Sink(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

pub type RelayState = Arc<dyn MessageSink>;

pub fn router(sink: RelayState) -> Router {
    Router::new()
        .route("/create-task", post(task_created))
        .route("/scheduler", post(digest))
        .with_state(sink)
}

async fn task_created(
    state: State<RelayState>,
    payload: Result<Json<DispatchMessage>, JsonRejection>,
) -> Result<StatusCode, RelayError> {
    forward(NoticeKind::TaskCreated, state, payload).await
}

async fn digest(
    state: State<RelayState>,
    payload: Result<Json<DispatchMessage>, JsonRejection>,
) -> Result<StatusCode, RelayError> {
    forward(NoticeKind::Digest, state, payload).await
}

async fn forward(
    kind: NoticeKind,
    State(sink): State<RelayState>,
    payload: Result<Json<DispatchMessage>, JsonRejection>,
) -> Result<StatusCode, RelayError> {
    let Json(msg) = payload?;
    if msg.text.trim().is_empty() {
        return Err(RelayError::EmptyText);
    }

    if let Err(e) = sink.send(msg.chat_id, &msg.text).await {
        warn!(chat_id = msg.chat_id, path = kind.path(), error = %e, "Relay delivery failed");
        return Err(e.into());
    }

    info!(chat_id = msg.chat_id, path = kind.path(), "Message relayed");
    Ok(StatusCode::CREATED)
}
