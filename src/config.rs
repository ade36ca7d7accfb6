use anyhow::Context;
use serde::Deserialize;

/// Upper bound for either token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "userauth".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "userauth-users".into()),
            ttl_minutes: ttl("JWT_TTL_MINUTES", env_parse("JWT_TTL_MINUTES").unwrap_or(60))?,
            reset_ttl_minutes: ttl(
                "JWT_RESET_TTL_MINUTES",
                env_parse("JWT_RESET_TTL_MINUTES").unwrap_or(15),
            )?,
        };

        Ok(Self {
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT").unwrap_or(8080),
            jwt,
        })
    }
}

fn ttl(key: &str, minutes: i64) -> anyhow::Result<i64> {
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}"
    );
    Ok(minutes)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
