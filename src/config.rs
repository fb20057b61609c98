use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;

const DEFAULT_TTL_MINUTES: i64 = 60 * 24;
const MAX_TTL_MINUTES: i64 = 60 * 24 * 366;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credentials for the administrator account created at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = get("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let ttl_minutes = match get("JWT_TTL_MINUTES").map(|v| v.parse::<i64>()) {
            None => DEFAULT_TTL_MINUTES,
            Some(Ok(v)) if v > 0 && v <= MAX_TTL_MINUTES => v,
            Some(_) => {
                warn!(default = DEFAULT_TTL_MINUTES, "invalid JWT_TTL_MINUTES, using default");
                DEFAULT_TTL_MINUTES
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "sportmanager".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "sportmanager-api".into()),
            ttl_minutes,
        };

        let admin = match (get("ADMIN_USERNAME"), get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(username), Some(email), Some(password)) => Some(AdminSeed {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => bail!("ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            database_url,
            max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: get("APP_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            jwt,
            admin,
        })
    }
}
