//! Telegram side of the task board.
//!
//! Two halves share one process: an HTTP relay the task server posts
//! notifications to, and a command dispatcher that lets users link their
//! chat and ask for their task list. The bot never touches the database;
//! everything goes through the task server's HTTP API.

pub mod api;
pub mod commands;
pub mod config;
pub mod handlers;
pub mod relay;
