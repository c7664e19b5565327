use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote WorkMate backend.
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
    /// How many interview questions to request per interview.
    pub interview_question_count: usize,
    pub session_idle_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let interview_question_count = parse_env("INTERVIEW_QUESTION_COUNT", 5usize)?;
        if interview_question_count == 0 {
            bail!("INTERVIEW_QUESTION_COUNT must be at least 1");
        }

        Ok(Config {
            upstream_url: require_env("UPSTREAM_URL")?
                .trim_end_matches('/')
                .to_string(),
            upstream_timeout: Duration::from_secs(parse_env("UPSTREAM_TIMEOUT_SECS", 60)?),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            interview_question_count,
            session_idle_timeout: Duration::from_secs(parse_env("SESSION_IDLE_TIMEOUT_SECS", 3600)?),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests() -> Self {
        Config {
            upstream_url: "http://upstream.test".to_string(),
            upstream_timeout: Duration::from_secs(5),
            port: 0,
            rust_log: "debug".to_string(),
            interview_question_count: 5,
            session_idle_timeout: Duration::from_secs(60),
            max_upload_bytes: 1024,
        }
    }
}
