//! Server configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use taskboard_core::digest::DEFAULT_CONCURRENCY;
use taskboard_core::scheduler::DailySchedule;

const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me", "secret"];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Base URL of the notification bot relay
    pub dispatcher_url: String,
    pub dispatch_timeout: Duration,
    /// Daily digest time, UTC
    pub digest_at: DailySchedule,
    pub digest_concurrency: usize,
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("TASKBOARD_JWT_SECRET").ok_or(ConfigError::Missing("TASKBOARD_JWT_SECRET"))?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::Invalid {
                key: "TASKBOARD_JWT_SECRET",
                reason: "still a placeholder; set a random secret".into(),
            });
        }

        let digest_at = match var("TASKBOARD_DIGEST_AT") {
            Some(raw) => DailySchedule::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "TASKBOARD_DIGEST_AT",
                reason: format!("expected HH:MM, got {raw:?}"),
            })?,
            None => DailySchedule::default(),
        };

        let digest_concurrency = positive(&var, "TASKBOARD_DIGEST_CONCURRENCY", DEFAULT_CONCURRENCY as u64)?;
        let dispatch_timeout = positive(&var, "TASKBOARD_DISPATCH_TIMEOUT_SECS", 5)?;

        let access_minutes = positive(&var, "TASKBOARD_ACCESS_TTL_MINUTES", 15)?;
        let access_ttl = i64::try_from(access_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .filter(representable)
            .ok_or_else(|| out_of_range("TASKBOARD_ACCESS_TTL_MINUTES"))?;

        let refresh_days = positive(&var, "TASKBOARD_REFRESH_TTL_DAYS", 60)?;
        let refresh_ttl = i64::try_from(refresh_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .filter(representable)
            .ok_or_else(|| out_of_range("TASKBOARD_REFRESH_TTL_DAYS"))?;

        Ok(Self {
            jwt_secret,
            db_path: var("TASKBOARD_DB_PATH").unwrap_or_else(|| "taskboard.db".into()).into(),
            host: var("TASKBOARD_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&var, "TASKBOARD_PORT", 8080)?,
            dispatcher_url: var("TASKBOARD_DISPATCHER_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8081".into()),
            dispatch_timeout: Duration::from_secs(dispatch_timeout),
            digest_at,
            digest_concurrency: usize::try_from(digest_concurrency)
                .map_err(|_| out_of_range("TASKBOARD_DIGEST_CONCURRENCY"))?,
            access_ttl,
            refresh_ttl,
        })
    }
}

fn parse<T, V>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// A whole number of at least 1; negatives fail to parse as `u64`.
fn positive<V>(var: &V, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    let value = parse(var, key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be at least 1".into(),
        });
    }
    Ok(value)
}

/// Tokens are stamped `now + ttl`, which must stay a valid timestamp.
fn representable(ttl: &chrono::Duration) -> bool {
    chrono::Utc::now().checked_add_signed(*ttl).is_some()
}

fn out_of_range(key: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: "value is too large".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("TASKBOARD_JWT_SECRET", "s3cr3t-value")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.db_path, PathBuf::from("taskboard.db"));
        assert_eq!(config.dispatcher_url, "http://127.0.0.1:8081");
        assert_eq!(config.dispatch_timeout, Duration::from_secs(5));
        assert_eq!(config.digest_at, DailySchedule::default());
        assert_eq!(config.digest_concurrency, 4);
        assert_eq!(config.access_ttl, chrono::Duration::minutes(15));
        assert_eq!(config.refresh_ttl, chrono::Duration::days(60));
    }

    #[test]
    fn secret_is_required_and_not_a_placeholder() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("TASKBOARD_JWT_SECRET"))));
        assert!(matches!(
            load(&[("TASKBOARD_JWT_SECRET", "   ")]),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            load(&[("TASKBOARD_JWT_SECRET", "dev-secret-change-me")]),
            Err(ConfigError::Invalid { key: "TASKBOARD_JWT_SECRET", .. })
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("TASKBOARD_JWT_SECRET", "s3cr3t-value"),
            ("TASKBOARD_PORT", "9000"),
            ("TASKBOARD_DIGEST_AT", "06:45"),
            ("TASKBOARD_DIGEST_CONCURRENCY", "8"),
            ("TASKBOARD_REFRESH_TTL_DAYS", "7"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.digest_at, DailySchedule::parse("06:45").unwrap());
        assert_eq!(config.digest_concurrency, 8);
        assert_eq!(config.refresh_ttl, chrono::Duration::days(7));
    }

    #[test]
    fn bad_values_name_their_key() {
        let secret = ("TASKBOARD_JWT_SECRET", "s3cr3t-value");
        assert!(matches!(
            load(&[secret, ("TASKBOARD_PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "TASKBOARD_PORT", .. })
        ));
        assert!(matches!(
            load(&[secret, ("TASKBOARD_DIGEST_AT", "midnight")]),
            Err(ConfigError::Invalid { key: "TASKBOARD_DIGEST_AT", .. })
        ));
        assert!(matches!(
            load(&[secret, ("TASKBOARD_DIGEST_CONCURRENCY", "0")]),
            Err(ConfigError::Invalid { key: "TASKBOARD_DIGEST_CONCURRENCY", .. })
        ));
    }

    #[test]
    fn durations_must_be_positive_and_in_range() {
        let secret = ("TASKBOARD_JWT_SECRET", "s3cr3t-value");
        for (key, raw) in [
            ("TASKBOARD_REFRESH_TTL_DAYS", "0"),
            ("TASKBOARD_REFRESH_TTL_DAYS", "-3"),
            ("TASKBOARD_REFRESH_TTL_DAYS", "9999999999999"),
            ("TASKBOARD_REFRESH_TTL_DAYS", "999999999999999"),
            ("TASKBOARD_ACCESS_TTL_MINUTES", "0"),
            ("TASKBOARD_ACCESS_TTL_MINUTES", "18446744073709551615"),
            ("TASKBOARD_DISPATCH_TIMEOUT_SECS", "0"),
        ] {
            match load(&[secret, (key, raw)]) {
                Err(ConfigError::Invalid { key: got, .. }) => assert_eq!(got, key, "{key}={raw}"),
                other => panic!("{key}={raw} should be invalid, got {other:?}"),
            }
        }
    }
}
