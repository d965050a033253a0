//! Domain services for the task board: accounts and sessions, board/task/status
//! CRUD, and the daily digest with its scheduler.

pub mod accounts;
pub mod boards;
pub mod digest;
pub mod error;
pub mod format;
pub mod notifier;
pub mod password;
pub mod scheduler;
pub mod session;
pub mod statuses;
pub mod tasks;

pub use error::{AuthError, CoreError, Result};
