use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_URL not set, using default");
                    "sqlite://clinic.db?mode=rwc".to_string()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            access_token_ttl_minutes: parse_or("ACCESS_TOKEN_TTL_MINUTES", 60),
            refresh_token_ttl_days: parse_or("REFRESH_TOKEN_TTL_DAYS", 7),
            port: parse_or("PORT", 3000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", 100),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 900),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.database_url.is_empty() && !self.jwt_secret.is_empty()
    }

    /// An empty origin list means any origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.is_empty()
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
