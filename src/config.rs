/*
 * Responsibility
 * - Load settings from environment variables (`.env` via dotenvy)
 * - Validate them up front (invalid values fail startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Router-wide transport limits.
#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    pub timeout: Duration,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub http: HttpLimits,

    // Allowed |now - token timestamp|, milliseconds.
    pub token_max_skew_millis: i64,

    // Static allow-list; always part of the snapshot.
    pub service_ids: Vec<String>,
    // When set, the allow-list is also loaded from this Valkey/Redis set.
    pub valkey_url: Option<String>,
    pub service_ids_key: String,
    pub service_ids_refresh: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match get("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let cors_allowed_origins = split_list(get("CORS_ALLOWED_ORIGINS"));

        let timeout_seconds: u64 = parse_or(&get, "HTTP_TIMEOUT_SECONDS", 30)?;
        let body_limit_bytes: usize = parse_or(&get, "HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;
        if timeout_seconds == 0 {
            return Err(ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"));
        }

        let token_max_skew_millis: i64 = parse_or(&get, "TOKEN_MAX_SKEW_MILLIS", 5 * 60 * 1000)?;
        if token_max_skew_millis <= 0 {
            return Err(ConfigError::Invalid("TOKEN_MAX_SKEW_MILLIS"));
        }

        let service_ids = split_list(get("SERVICE_IDS"));

        let valkey_url = get("VALKEY_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let service_ids_key = get("SERVICE_IDS_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "gate:service_ids".to_string());

        let refresh_seconds: u64 = parse_or(&get, "SERVICE_IDS_REFRESH_SECONDS", 60)?;
        if refresh_seconds == 0 {
            return Err(ConfigError::Invalid("SERVICE_IDS_REFRESH_SECONDS"));
        }

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            http: HttpLimits {
                timeout: Duration::from_secs(timeout_seconds),
                body_limit_bytes,
            },
            token_max_skew_millis,
            service_ids,
            valkey_url,
            service_ids_key,
            service_ids_refresh: Duration::from_secs(refresh_seconds),
        })
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Unset → default; set but unparsable → error (a typo should not silently fall back).
fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
