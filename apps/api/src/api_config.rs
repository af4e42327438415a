use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;
use trustline_application::{OAuthSettings, ResourceLimits};
use trustline_core::AppError;
use tracing_subscriber::EnvFilter;

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    PurgeExpired,
}

impl ApiCommand {
    fn parse(argument: Option<&str>) -> Result<Self, AppError> {
        match argument {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("purge-expired") => Ok(Self::PurgeExpired),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'serve', 'migrate', or 'purge-expired'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub oauth: OAuthSettings,
    pub limits: ResourceLimits,
    pub purge_retention: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = ApiCommand::parse(env::args().nth(1).as_deref())?;

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = env::var("AUTH_BOOTSTRAP_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let authorization_code_ttl = numeric_env("AUTHORIZATION_CODE_TTL_SECONDS", 600)?;
        if !(1..=3600).contains(&authorization_code_ttl) {
            return Err(AppError::Validation(
                "AUTHORIZATION_CODE_TTL_SECONDS must be between 1 and 3600".to_owned(),
            ));
        }
        let access_token_ttl = numeric_env("ACCESS_TOKEN_TTL_SECONDS", 3600)?;
        if access_token_ttl < 1 {
            return Err(AppError::Validation(
                "ACCESS_TOKEN_TTL_SECONDS must be positive".to_owned(),
            ));
        }

        let limits = ResourceLimits {
            connections_limit: positive_env("CONNECTIONS_LIST_LIMIT", 50)?,
            journal_limit: positive_env("JOURNAL_ENTRY_LIMIT", 5)?,
            max_visited_users: positive_env("CONNECTION_MAX_VISITED", 10_000)?,
        };
        let purge_retention = Duration::days(numeric_env("PURGE_RETENTION_DAYS", 7)?.max(0));

        Ok(Self {
            command,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            oauth: OAuthSettings {
                authorization_code_ttl: Duration::seconds(authorization_code_ttl),
                access_token_ttl: Duration::seconds(access_token_ttl),
            },
            limits,
            purge_retention,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn numeric_env(name: &str, default: i64) -> Result<i64, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<i64>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        _ => Ok(default),
    }
}

fn positive_env(name: &str, default: usize) -> Result<usize, AppError> {
    let value = numeric_env(name, i64::try_from(default).unwrap_or(i64::MAX))?;
    usize::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| AppError::Validation(format!("{name} must be a positive integer")))
}
