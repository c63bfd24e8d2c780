//! Configuration management for the API server
//!
//! Configuration comes from environment variables; a `.env` file is loaded
//! first when present.
//!
//! # Environment Variables
//!
//! - `API_HOST`: host to bind to (default: 0.0.0.0)
//! - `API_PORT`: port to bind to (default: 8080)
//! - `CORS_ORIGINS`: comma-separated allowed origins, `*` for any (default: *)
//! - `PRODUCTION`: `true` enables HSTS (default: false)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `JWT_SECRET`: token signing secret, at least 32 characters (required)
//! - `JWT_EXPIRY_MINUTES`: session lifetime (default: 60)
//! - `SMTP_HOST`: SMTP relay; when unset, emails are only logged
//! - `SMTP_PORT`: SMTP port (default: 587)
//! - `SMTP_USERNAME`, `SMTP_PASSWORD`: optional SMTP credentials
//! - `MAIL_FROM`: sender address (default: Taskflow <no-reply@taskflow.local>)
//! - `LOG_FORMAT`: `json` for JSON log lines, anything else for text
//! - `RUST_LOG`: log filter (default: taskflow_api=debug,taskflow_shared=debug,tower_http=debug)
//!
//! # Example
//!
//! ```no_run
//! use taskflow_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use std::env;
use taskflow_shared::auth::jwt::DEFAULT_SESSION_MINUTES;
use taskflow_shared::db::pool;
use taskflow_shared::mail::smtp::{SmtpConfig, DEFAULT_SMTP_PORT};

const DEFAULT_MAIL_FROM: &str = "Taskflow <no-reply@taskflow.local>";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,

    /// Enables HSTS
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Pool settings with the remaining knobs at their defaults
    pub fn pool_config(&self) -> pool::DatabaseConfig {
        pool::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret. Generate with `openssl rand -hex 32`.
    pub secret: String,

    /// Session lifetime in minutes
    pub expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// `None` selects the log-only mailer
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from: String,
}

impl MailConfig {
    /// SMTP settings, if an SMTP host is configured
    pub fn smtp(&self) -> Option<SmtpConfig> {
        self.smtp_host.as_ref().map(|host| SmtpConfig {
            host: host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from: self.from.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub json: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing or a value does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = var("PRODUCTION")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiry_minutes = match var("JWT_EXPIRY_MINUTES") {
            Some(v) => v
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("JWT_EXPIRY_MINUTES is invalid: {}", e))?,
            None => DEFAULT_SESSION_MINUTES,
        };

        if expiry_minutes <= 0 {
            anyhow::bail!("JWT_EXPIRY_MINUTES must be positive");
        }

        let smtp_port = match var("SMTP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("SMTP_PORT is invalid: {}", e))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiry_minutes,
            },
            mail: MailConfig {
                smtp_host: var("SMTP_HOST"),
                smtp_port,
                smtp_username: var("SMTP_USERNAME"),
                smtp_password: var("SMTP_PASSWORD"),
                from: var("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            },
            log: LogConfig {
                json: var("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.jwt.expiry_minutes)
    }
}
