use teloxide::{
    RequestError,
    dispatching::{HandlerExt, UpdateHandler},
    prelude::*,
    utils::command::BotCommands,
};
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::commands::Command;

pub(crate) const NO_USERNAME: &str =
    "Your Telegram account has no username. Set one in Telegram settings, then send /start again.";
pub(crate) const LINKED: &str = "Chat linked. You will get task notifications and a daily digest here.";
pub(crate) const UNKNOWN_USER: &str =
    "No task board account is linked to this chat. Register with your Telegram username, then send /start.";
pub(crate) const SERVER_DOWN: &str = "The task board is unavailable right now. Try again later.";
pub(crate) const TASKS_QUEUED: &str = "Fetching your tasks...";

pub fn schema() -> UpdateHandler<RequestError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command)
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, api: ApiClient) -> ResponseResult<()> {
    let username = msg.from.as_ref().and_then(|user| user.username.as_deref());
    let chat_id = msg.chat.id.0;

    let reply = match cmd {
        Command::Start => start_reply(&api, username, chat_id).await,
        Command::Tasks => tasks_reply(&api, username, chat_id).await,
        Command::Help => Command::descriptions().to_string(),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub(crate) async fn start_reply(api: &ApiClient, username: Option<&str>, chat_id: i64) -> String {
    let Some(username) = username else {
        return NO_USERNAME.to_string();
    };

    match api.link_chat(username, chat_id).await {
        Ok(()) => LINKED.to_string(),
        Err(e) => failure_reply(&e, username, chat_id),
    }
}

/// The digest itself arrives through the relay; this only acknowledges.
pub(crate) async fn tasks_reply(api: &ApiClient, username: Option<&str>, chat_id: i64) -> String {
    let Some(username) = username else {
        return NO_USERNAME.to_string();
    };

    match api.send_tasks(username, chat_id).await {
        Ok(()) => TASKS_QUEUED.to_string(),
        Err(e) => failure_reply(&e, username, chat_id),
    }
}

fn failure_reply(err: &ApiError, username: &str, chat_id: i64) -> String {
    if err.is_unknown_user() {
        UNKNOWN_USER.to_string()
    } else {
        warn!(username, chat_id, error = %err, "Task board request failed");
        SERVER_DOWN.to_string()
    }
}
