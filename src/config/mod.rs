use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "natours-development-secret-change-me";
const MAX_COOKIE_DAYS: i64 = 3650;
const MAX_RESET_TTL_MINUTES: u64 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub query: QueryConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL used to build links sent to users (password reset)
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; the in-memory store is used when absent
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub jwt_cookie_expires_days: i64,
    pub bcrypt_cost: u32,
    pub password_reset_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup, environment defaults first
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        config.with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("PORT") {
            self.server.port = parse("PORT", &v)?;
        }
        match lookup("PUBLIC_URL") {
            Some(v) => {
                url::Url::parse(&v).map_err(|_| ConfigError::Invalid { key: "PUBLIC_URL", value: v.clone() })?;
                self.server.public_url = v.trim_end_matches('/').to_string();
            }
            None => self.server.public_url = format!("http://127.0.0.1:{}", self.server.port),
        }

        // Query overrides
        if let Some(v) = lookup("QUERY_DEFAULT_LIMIT") {
            self.query.default_limit = parse("QUERY_DEFAULT_LIMIT", &v)?;
        }
        if let Some(v) = lookup("QUERY_MAX_LIMIT") {
            self.query.max_limit = parse("QUERY_MAX_LIMIT", &v)?;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            let parsed = url::Url::parse(&v).map_err(|_| ConfigError::Invalid {
                key: "DATABASE_URL",
                value: "<redacted>".to_string(),
            })?;
            if !matches!(parsed.scheme(), "postgres" | "postgresql") {
                return Err(ConfigError::Invalid {
                    key: "DATABASE_URL",
                    value: format!("unsupported scheme {}", parsed.scheme()),
                });
            }
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // API overrides
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        match lookup("JWT_SECRET") {
            Some(v) if !v.is_empty() => self.security.jwt_secret = v,
            _ if self.environment.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            _ => {}
        }
        if let Some(v) = lookup("JWT_EXPIRES_IN") {
            self.security.jwt_expires_in = parse_duration(&v)
                .ok_or(ConfigError::Invalid { key: "JWT_EXPIRES_IN", value: v.clone() })?;
        }
        if let Some(v) = lookup("JWT_COOKIE_EXPIRES_IN") {
            let days: i64 = parse("JWT_COOKIE_EXPIRES_IN", &v)?;
            if !(1..=MAX_COOKIE_DAYS).contains(&days) {
                return Err(ConfigError::Invalid { key: "JWT_COOKIE_EXPIRES_IN", value: v.clone() });
            }
            self.security.jwt_cookie_expires_days = days;
        }
        if let Some(v) = lookup("BCRYPT_COST") {
            self.security.bcrypt_cost = parse("BCRYPT_COST", &v)?;
        }
        if let Some(v) = lookup("PASSWORD_RESET_TTL_MINUTES") {
            let minutes: u64 = parse("PASSWORD_RESET_TTL_MINUTES", &v)?;
            let seconds = minutes
                .checked_mul(60)
                .filter(|_| (1..=MAX_RESET_TTL_MINUTES).contains(&minutes))
                .ok_or(ConfigError::Invalid { key: "PASSWORD_RESET_TTL_MINUTES", value: v.clone() })?;
            self.security.password_reset_ttl = Duration::from_secs(seconds);
        }

        if self.query.default_limit == 0 || self.query.max_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "QUERY_DEFAULT_LIMIT",
                value: "limits must be positive".to_string(),
            });
        }

        Ok(self)
    }

    /// True when the development JWT secret is in use
    pub fn uses_development_secret(&self) -> bool {
        self.security.jwt_secret == DEV_JWT_SECRET
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                public_url: "http://127.0.0.1:3000".to_string(),
            },
            query: QueryConfig {
                default_limit: 10,
                max_limit: 1000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024, // 10KB
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expires_in: Duration::from_secs(90 * 24 * 60 * 60),
                jwt_cookie_expires_days: 90,
                bcrypt_cost: 12,
                password_reset_ttl: Duration::from_secs(10 * 60),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.query.max_limit = 500;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.cors_origins = vec!["https://staging.natours.dev".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.query.max_limit = 100;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.security.cors_origins = vec!["https://natours.dev".to_string()];
        config.security.jwt_secret = String::new();
        config
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

/// Parse durations such as `90d`, `12h`, `30m`, `45s` (bare numbers are seconds)
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };
    let amount: u64 = digits.parse().ok()?;
    let seconds = match unit {
        "s" => amount,
        "m" => amount.checked_mul(60)?,
        "h" => amount.checked_mul(60 * 60)?,
        "d" => amount.checked_mul(24 * 60 * 60)?,
        _ => return None,
    };
    Some(Duration::from_secs(seconds))
}
