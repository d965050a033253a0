use std::sync::Arc;

use taskboard_db::Database;
use taskboard_types::models::{Status, TaskStatus};

use crate::error::{CoreError, Result, required};

pub struct StatusService {
    db: Arc<Database>,
}

impl StatusService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, kind: &str) -> Result<Status> {
        let kind = required(kind, "type")?;
        Ok(self.db.create_status(kind)?.into())
    }

    pub fn list(&self) -> Result<Vec<Status>> {
        Ok(self.db.list_statuses()?.into_iter().map(Status::from).collect())
    }

    /// The three lifecycle rows are permanent.
    pub fn delete(&self, id: i64) -> Result<()> {
        if TaskStatus::try_from(id).is_ok() {
            return Err(CoreError::conflict(format!("status {id} is built in")));
        }
        if !self.db.delete_status(id)? {
            return Err(CoreError::NotFound("status"));
        }
        Ok(())
    }
}
