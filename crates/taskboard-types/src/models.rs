use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a task.
///
/// The numeric values are persisted as `tasks.status_id` and match the three
/// rows seeded into `statuses`. Any other value is rejected on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum TaskStatus {
    Open = 1,
    CompletedPendingReport = 2,
    Archived = 3,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Open,
        TaskStatus::CompletedPendingReport,
        TaskStatus::Archived,
    ];

    pub fn id(self) -> i64 {
        self as i64
    }

    /// Label stored in `statuses.type` for the seeded row.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Open => "in progress",
            TaskStatus::CompletedPendingReport => "completed",
            TaskStatus::Archived => "archived",
        }
    }
}

impl From<TaskStatus> for i64 {
    fn from(status: TaskStatus) -> Self {
        status.id()
    }
}

impl TryFrom<i64> for TaskStatus {
    type Error = InvalidTaskStatus;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TaskStatus::Open),
            2 => Ok(TaskStatus::CompletedPendingReport),
            3 => Ok(TaskStatus::Archived),
            other => Err(InvalidTaskStatus(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid task status id {0}")]
pub struct InvalidTaskStatus(pub i64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub tg_name: Option<String>,
    pub chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub board_id: i64,
    pub status_id: TaskStatus,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Stored refresh-token record; at most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserToken {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token: String,
}
