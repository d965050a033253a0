use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Task board commands:")]
pub enum Command {
    #[command(description = "link this chat to your task board account.")]
    Start,
    #[command(description = "send your open and completed tasks.")]
    Tasks,
    #[command(description = "show this message.")]
    Help,
}
