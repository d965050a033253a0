use std::sync::Arc;

use chrono::Utc;
use taskboard_db::Database;
use taskboard_db::models::TaskRow;
use taskboard_db::tasks::TaskFields;
use taskboard_types::api::{CreateTaskRequest, UpdateTaskRequest};
use taskboard_types::models::{Task, TaskStatus};
use taskboard_types::notify::NoticeKind;

use crate::error::{CoreError, Result, required};
use crate::format;
use crate::notifier::Notifier;

pub struct TaskService {
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
}

impl TaskService {
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// New tasks always start open, whatever status the request carries.
    /// The owner defaults to the caller. The creation notice goes out in the
    /// background after the row is committed.
    pub async fn create(&self, caller_id: i64, req: &CreateTaskRequest) -> Result<Task> {
        let title = required(&req.title, "title")?;
        let board_id = req.board_id.ok_or_else(|| CoreError::validation("board_id is required"))?;
        let user_id = req.user_id.unwrap_or(caller_id);
        self.check_refs(board_id, user_id)?;

        if req.status_id.is_some_and(|s| s != TaskStatus::Open.id()) {
            tracing::debug!(status_id = ?req.status_id, "Ignoring status on create");
        }

        let fields = TaskFields {
            title,
            description: &req.description,
            board_id,
            status: TaskStatus::Open,
            user_id,
        };
        let row = self.db.insert_task(&fields, Utc::now())?;
        tracing::info!(task_id = row.id, board_id, user_id, "Task created");

        self.announce(&row);
        Ok(row.into())
    }

    pub fn list(&self) -> Result<Vec<Task>> {
        Ok(self.db.list_tasks()?.into_iter().map(Task::from).collect())
    }

    pub fn get(&self, id: i64) -> Result<Option<Task>> {
        Ok(self.db.get_task(id)?.map(Task::from))
    }

    /// Full replace; every field must be present and valid.
    pub fn update(&self, id: i64, req: &UpdateTaskRequest) -> Result<Option<Task>> {
        let title = required(&req.title, "title")?;
        let board_id = req.board_id.ok_or_else(|| CoreError::validation("board_id is required"))?;
        let user_id = req.user_id.ok_or_else(|| CoreError::validation("user_id is required"))?;
        let status_id = req.status_id.ok_or_else(|| CoreError::validation("status_id is required"))?;
        let status = TaskStatus::try_from(status_id).map_err(|e| CoreError::validation(e.to_string()))?;
        self.check_refs(board_id, user_id)?;

        let fields = TaskFields {
            title,
            description: &req.description,
            board_id,
            status,
            user_id,
        };
        Ok(self.db.replace_task(id, &fields, Utc::now())?.map(Task::from))
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.db.delete_task(id)?)
    }

    fn check_refs(&self, board_id: i64, user_id: i64) -> Result<()> {
        if !self.db.board_exists(board_id)? {
            return Err(CoreError::validation(format!("board {board_id} does not exist")));
        }
        if !self.db.user_exists(user_id)? {
            return Err(CoreError::validation(format!("user {user_id} does not exist")));
        }
        Ok(())
    }

    fn announce(&self, task: &TaskRow) {
        let db = self.db.clone();
        let notifier = self.notifier.clone();
        let task_id = task.id;
        let user_id = task.user_id;
        let text = format::task_created(&task.title, &task.description);

        tokio::spawn(async move {
            let chat_id = match db.chat_id_for_user(user_id) {
                Ok(Some(chat_id)) => chat_id,
                Ok(None) => {
                    tracing::debug!(task_id, user_id, "Owner has no chat linked, skipping notice");
                    return;
                }
                Err(e) => {
                    tracing::warn!(task_id, user_id, error = %e, "Could not look up owner chat");
                    return;
                }
            };

            if let Err(e) = notifier.deliver(NoticeKind::TaskCreated, chat_id, &text).await {
                tracing::warn!(task_id, chat_id, error = %e, "Task creation notice failed");
            }
        });
    }
}
