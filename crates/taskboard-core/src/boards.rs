use std::sync::Arc;

use chrono::Utc;
use taskboard_db::Database;
use taskboard_types::models::Board;

use crate::error::{CoreError, Result, required};

pub struct BoardService {
    db: Arc<Database>,
}

impl BoardService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Creates the board with `creator_id` as its first member.
    pub fn create(&self, name: &str, creator_id: i64) -> Result<Board> {
        let name = required(name, "name")?;
        let row = self.db.create_board(name, creator_id, Utc::now())?;
        tracing::info!(board_id = row.id, creator_id, "Board created");
        Ok(row.into())
    }

    pub fn list(&self) -> Result<Vec<Board>> {
        Ok(self.db.list_boards()?.into_iter().map(Board::from).collect())
    }

    pub fn get(&self, id: i64) -> Result<Option<Board>> {
        Ok(self.db.get_board(id)?.map(Board::from))
    }

    pub fn update(&self, id: i64, name: &str) -> Result<Option<Board>> {
        let name = required(name, "name")?;
        Ok(self.db.update_board(id, name, Utc::now())?.map(Board::from))
    }

    /// Refused while tasks still reference the board. Returns whether it existed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        if !self.db.board_exists(id)? {
            return Ok(false);
        }
        let tasks = self.db.count_tasks_on_board(id)?;
        if tasks > 0 {
            return Err(CoreError::conflict(format!("board still has {tasks} task(s)")));
        }
        self.db.delete_board(id).map_err(CoreError::from)
    }

    pub fn add_member(&self, board_id: Option<i64>, user_id: Option<i64>) -> Result<()> {
        let board_id = board_id.ok_or_else(|| CoreError::validation("board_id is required"))?;
        let user_id = user_id.ok_or_else(|| CoreError::validation("user_id is required"))?;

        if !self.db.board_exists(board_id)? {
            return Err(CoreError::NotFound("board"));
        }
        if !self.db.user_exists(user_id)? {
            return Err(CoreError::validation(format!("user {user_id} does not exist")));
        }

        self.db.add_board_member(board_id, user_id)?;
        tracing::debug!(board_id, user_id, "Board member linked");
        Ok(())
    }

    pub fn members(&self, board_id: i64) -> Result<Vec<i64>> {
        Ok(self.db.board_members(board_id)?)
    }
}
