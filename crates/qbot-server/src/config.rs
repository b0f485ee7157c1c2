use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use qbot_db::PoolConfig;
use qbot_gateway::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Clone)]
pub struct Config {
    pub slack_token: String,
    pub db_path: PathBuf,
    pub queue_capacity: usize,
    pub pool: PoolConfig,
    pub list_limit: u32,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup so parsing can be tested without touching the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let slack_token = lookup("QBOT_SLACK_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("QBOT_SLACK_TOKEN must be set"))?;

        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            max_open: parse_or(&lookup, "QBOT_DB_MAX_OPEN", defaults.max_open)?,
            max_idle: parse_or(&lookup, "QBOT_DB_MAX_IDLE", defaults.max_idle)?,
            max_lifetime: Duration::from_secs(parse_or(
                &lookup,
                "QBOT_DB_CONN_LIFETIME_SECS",
                defaults.max_lifetime.as_secs(),
            )?),
        };
        // A lifetime of 0 is accepted and means connections are never recycled.
        if pool.max_open == 0 {
            return Err(anyhow!("QBOT_DB_MAX_OPEN must be greater than zero"));
        }

        let queue_capacity = parse_or(&lookup, "QBOT_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;
        if queue_capacity == 0 {
            return Err(anyhow!("QBOT_QUEUE_CAPACITY must be greater than zero"));
        }

        let list_limit = parse_or(&lookup, "QBOT_LIST_LIMIT", 10)?;
        if list_limit == 0 {
            return Err(anyhow!("QBOT_LIST_LIMIT must be greater than zero"));
        }

        Ok(Self {
            slack_token,
            db_path: lookup("QBOT_DB_PATH").unwrap_or_else(|| "qbot.db".into()).into(),
            queue_capacity,
            pool,
            list_limit,
            debug: parse_or(&lookup, "QBOT_DEBUG", false)?,
        })
    }

    /// Default log filter when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "qbot=debug,qbot_gateway=debug,qbot_db=debug,qbot_slack=debug"
        } else {
            "qbot=info,qbot_gateway=info,qbot_db=info,qbot_slack=info"
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_runtime_limits() {
        let config = Config::from_lookup(lookup(&[("QBOT_SLACK_TOKEN", "xoxb-1")])).unwrap();
        assert_eq!(config.queue_capacity, 500);
        assert_eq!(config.pool.max_open, 200);
        assert_eq!(config.pool.max_idle, 50);
        assert_eq!(config.pool.max_lifetime, Duration::from_secs(100));
        assert_eq!(config.list_limit, 10);
        assert_eq!(config.db_path, PathBuf::from("qbot.db"));
        assert!(!config.debug);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("QBOT_SLACK_TOKEN", "xoxb-1"),
            ("QBOT_DB_PATH", "/var/lib/qbot/qbot.db"),
            ("QBOT_QUEUE_CAPACITY", "64"),
            ("QBOT_DB_MAX_OPEN", "20"),
            ("QBOT_DEBUG", "true"),
        ]))
        .unwrap();
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.pool.max_open, 20);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/qbot/qbot.db"));
        assert!(config.debug);
        assert!(config.log_filter().contains("debug"));
    }

    #[test]
    fn token_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("QBOT_SLACK_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("QBOT_SLACK_TOKEN", "xoxb-1"),
            ("QBOT_QUEUE_CAPACITY", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("QBOT_QUEUE_CAPACITY"));

        assert!(
            Config::from_lookup(lookup(&[
                ("QBOT_SLACK_TOKEN", "xoxb-1"),
                ("QBOT_QUEUE_CAPACITY", "0"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn zero_open_connections_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("QBOT_SLACK_TOKEN", "xoxb-1"),
            ("QBOT_DB_MAX_OPEN", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("QBOT_DB_MAX_OPEN"));
    }

    #[test]
    fn zero_lifetime_is_accepted() {
        let config = Config::from_lookup(lookup(&[
            ("QBOT_SLACK_TOKEN", "xoxb-1"),
            ("QBOT_DB_CONN_LIFETIME_SECS", "0"),
        ]))
        .unwrap();
        assert!(config.pool.max_lifetime.is_zero());
    }

    #[test]
    fn zero_list_limit_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("QBOT_SLACK_TOKEN", "xoxb-1"),
            ("QBOT_LIST_LIMIT", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("QBOT_LIST_LIMIT"));
    }
}
