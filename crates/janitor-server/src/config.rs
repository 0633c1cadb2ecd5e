use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveTime;

use janitor_purge::scheduler::parse_times;
use janitor_types::models::UserId;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub policy_path: PathBuf,
    pub db_path: PathBuf,
    pub service_user: UserId,
    pub link_base: String,
    pub cleanup_times: Vec<NaiveTime>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("JANITOR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("JANITOR_JWT_SECRET is unset or still a placeholder");
        }

        let service_user: UserId = get("JANITOR_SERVICE_USER_ID")
            .context("JANITOR_SERVICE_USER_ID must be set to the service account's user id")?
            .parse()
            .context("JANITOR_SERVICE_USER_ID is not a valid id")?;

        let port: u16 = get("JANITOR_PORT")
            .unwrap_or_else(|| "3300".into())
            .parse()
            .context("JANITOR_PORT is not a valid port")?;

        let raw_times = get("JANITOR_CLEANUP_TIMES").unwrap_or_else(|| "09:00".into());
        let cleanup_times = parse_times(&raw_times)
            .with_context(|| format!("JANITOR_CLEANUP_TIMES '{}' is not a list of HH:MM times", raw_times))?;

        Ok(Self {
            host: get("JANITOR_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt_secret,
            policy_path: get("JANITOR_POLICY_PATH").unwrap_or_else(|| "config.json".into()).into(),
            db_path: get("JANITOR_DB_PATH").unwrap_or_else(|| "haven.db".into()).into(),
            service_user,
            link_base: get("JANITOR_LINK_BASE").unwrap_or_else(|| "http://localhost:3000".into()),
            cleanup_times,
        })
    }
}
