use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Prefix of `DATABASE_URL` that selects the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub price_tick_secs: u64,
    pub price_feed_seed: Option<u64>,
    pub auth_token_secret: String,
    pub auth_token_ttl_secs: i64,
    pub bootstrap_superadmin_password: Option<String>,
    pub seed_sample_accounts: bool,
    pub cors_allowed_origins: AllowedOrigins,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let auth_token_secret = env::var("AUTH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("AUTH_TOKEN_SECRET must be set"))?;
        if auth_token_secret.trim().is_empty() {
            anyhow::bail!("AUTH_TOKEN_SECRET must not be empty");
        }

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            price_tick_secs: parse_tick_secs(
                &env::var("PRICE_TICK_SECS").unwrap_or_else(|_| "30".to_string()),
            )?,
            price_feed_seed: env::var("PRICE_FEED_SEED")
                .ok()
                .map(|seed| seed.parse())
                .transpose()?,
            auth_token_secret,
            auth_token_ttl_secs: env::var("AUTH_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()?,
            bootstrap_superadmin_password: env::var("BOOTSTRAP_SUPERADMIN_PASSWORD")
                .ok()
                .filter(|password| !password.is_empty()),
            seed_sample_accounts: env::var("SEED_SAMPLE_ACCOUNTS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()?,
            cors_allowed_origins: parse_allowed_origins(
                &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            )?,
            log_format: parse_log_format(
                &env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            )?,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_URL)
    }

    pub fn price_tick_interval(&self) -> Duration {
        Duration::from_secs(self.price_tick_secs)
    }
}

fn parse_tick_secs(raw: &str) -> Result<u64> {
    let secs: u64 = raw.trim().parse()?;
    if secs == 0 {
        anyhow::bail!("PRICE_TICK_SECS must be greater than zero");
    }
    Ok(secs)
}

fn parse_allowed_origins(raw: &str) -> Result<AllowedOrigins> {
    let value = raw.trim();
    if value == "*" {
        return Ok(AllowedOrigins::Any);
    }

    let origins = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if origins.is_empty() {
        anyhow::bail!("CORS_ALLOWED_ORIGINS must be '*' or a comma-separated list of origins");
    }

    Ok(AllowedOrigins::List(origins))
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "text" | "" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
    }
}
