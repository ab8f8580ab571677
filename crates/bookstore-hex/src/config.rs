use anyhow::Context;
use bookstore_types::domain::user::{Principal, Role};
use std::env;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub app_env: AppEnv,
    pub store_timeout: Duration,
    /// `(token, principal)` pairs for the static identity provider.
    pub auth_tokens: Vec<(String, Principal)>,
    pub owner_status_updates: bool,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let app_env = match env::var("APP_ENV").as_deref() {
            Ok("development") => AppEnv::Development,
            Ok("production") | Err(_) => AppEnv::Production,
            Ok(other) => anyhow::bail!("APP_ENV must be development or production, got {other}"),
        };
        let store_timeout = match env::var("STORE_TIMEOUT_MS") {
            Ok(v) => Duration::from_millis(
                v.parse::<u64>()
                    .context("STORE_TIMEOUT_MS must be an integer")?,
            ),
            Err(_) => Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        };
        let auth_tokens = match env::var("AUTH_TOKENS") {
            Ok(v) => parse_auth_tokens(&v)?,
            Err(_) => Vec::new(),
        };
        let owner_status_updates = match env::var("ORDER_STATUS_OWNER_UPDATES") {
            Ok(v) => v
                .parse::<bool>()
                .context("ORDER_STATUS_OWNER_UPDATES must be true or false")?,
            Err(_) => false,
        };
        let cors_origin = env::var("CORS_ORIGIN").ok();
        Ok(Self {
            server_port,
            database_url,
            app_env,
            store_timeout,
            auth_tokens,
            owner_status_updates,
            cors_origin,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == AppEnv::Development
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: "3000".into(),
            database_url: None,
            app_env: AppEnv::Production,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            auth_tokens: Vec::new(),
            owner_status_updates: false,
            cors_origin: None,
        }
    }
}

/// Parses `token:user_uuid:role` triples separated by commas.
pub fn parse_auth_tokens(raw: &str) -> anyhow::Result<Vec<(String, Principal)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let (Some(token), Some(user), Some(role)) = (parts.next(), parts.next(), parts.next())
            else {
                anyhow::bail!("AUTH_TOKENS entry must be token:user_id:role");
            };
            if token.is_empty() {
                anyhow::bail!("AUTH_TOKENS entry has an empty token");
            }
            let user_id = Uuid::parse_str(user).context("AUTH_TOKENS user id must be a uuid")?;
            let role: Role = role.parse()?;
            Ok((token.to_string(), Principal { user_id, role }))
        })
        .collect()
}
