use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use tokio::net::TcpListener;
use tracing::{error, info};

use taskboard_bot::api::ApiClient;
use taskboard_bot::config::BotConfig;
use taskboard_bot::{handlers, relay};

const API_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_bot=debug,teloxide=info".into()),
        )
        .init();

    let config = BotConfig::from_env()?;
    let bot = Bot::new(&config.token);
    let api = ApiClient::new(&config.taskboard_url, API_TIMEOUT)?;

    let relay_app = relay::router(Arc::new(relay::TelegramSink::new(bot.clone())));
    let listener = TcpListener::bind(config.relay_addr).await?;
    info!("Relay listening on {}", config.relay_addr);

    let mut tasks = tokio::task::JoinSet::new();

    tasks.spawn(async move {
        if let Err(e) = axum::serve(listener, relay_app).await {
            error!("Relay server failed: {}", e);
        }
    });

    tasks.spawn(async move {
        info!("Starting telegram dispatcher...");
        Dispatcher::builder(bot, handlers::schema())
            .dependencies(dptree::deps![api])
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd.id);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    // Either half stopping takes the process down.
    if tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }
    info!("Bot shut down");
    Ok(())
}
