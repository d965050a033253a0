use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Base URL of the task server
    pub taskboard_url: String,
    pub relay_addr: SocketAddr,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let host = var("TASKBOARD_BOT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("TASKBOARD_BOT_PORT").unwrap_or_else(|| "8081".into());

        let relay_addr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "TASKBOARD_BOT_HOST/TASKBOARD_BOT_PORT",
                reason: e.to_string(),
            })?;

        Ok(Self {
            token,
            taskboard_url: var("TASKBOARD_URL").unwrap_or_else(|| "http://127.0.0.1:8080".into()),
            relay_addr,
        })
    }
}
