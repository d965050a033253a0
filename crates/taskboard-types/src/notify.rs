//! Messages exchanged between the task server and the notification bot.

use serde::{Deserialize, Serialize};

/// Body of `POST /create-task` and `POST /scheduler` on the bot relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub chat_id: i64,
    pub text: String,
}

/// A messaging handle and the chat it lives in.
///
/// Sent by the bot to `POST /add-chat-id` (link) and `POST /send-tasks`
/// (on-demand digest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHandle {
    pub tg_name: String,
    pub chat_id: i64,
}

/// Which relay endpoint a message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    TaskCreated,
    Digest,
}

impl NoticeKind {
    pub fn path(self) -> &'static str {
        match self {
            NoticeKind::TaskCreated => "create-task",
            NoticeKind::Digest => "scheduler",
        }
    }
}
