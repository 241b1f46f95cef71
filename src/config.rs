use std::env;
use std::fmt;
use thiserror::Error;

use crate::auth::password::{Hasher, DEFAULT_BCRYPT_COST};
use crate::auth::token::DEV_SECRET;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingSecret,
    #[error("JWT_SECRET must not be the development secret when APP_ENV=production")]
    DevSecretInProduction,
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

pub struct Config {
    pub environment: Environment,
    pub jwt_secret: String,
    pub hasher: Hasher,
    /// `None` selects the in-memory backend.
    pub database_url: Option<String>,
    pub allow_admin_registration: bool,
    pub server_port: u16,
    pub server_host: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("jwt_secret", &"<redacted>")
            .field("hasher", &self.hasher)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("allow_admin_registration", &self.allow_admin_registration)
            .field("server_port", &self.server_port)
            .field("server_host", &self.server_host)
            .finish()
    }
}

impl Config {
    /// Reads configuration from the process environment. Call `dotenv` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// A missing `JWT_SECRET` falls back to the development secret outside
    /// production and is an error in production.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("APP_ENV").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "APP_ENV",
                    value: other.to_string(),
                })
            }
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => return Err(ConfigError::MissingSecret),
            None => DEV_SECRET.to_string(),
        };
        if environment.is_production() && jwt_secret == DEV_SECRET {
            return Err(ConfigError::DevSecretInProduction);
        }

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "BCRYPT_COST", value })?,
            None => DEFAULT_BCRYPT_COST,
        };
        let hasher = match get("PASSWORD_HASHER").as_deref() {
            None | Some("sha256") => Hasher::Sha256,
            Some("bcrypt") => Hasher::Bcrypt { cost: bcrypt_cost },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "PASSWORD_HASHER",
                    value: other.to_string(),
                })
            }
        };

        let allow_admin_registration = match get("ALLOW_ADMIN_REGISTRATION") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                key: "ALLOW_ADMIN_REGISTRATION",
                value,
            })?,
            None => !environment.is_production(),
        };

        let server_port = match get("SERVER_PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "SERVER_PORT", value })?,
            None => 8080,
        };

        Ok(Self {
            environment,
            jwt_secret,
            hasher,
            database_url: get("DATABASE_URL"),
            allow_admin_registration,
            server_port,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// Settings that are tolerated but unsafe for the current environment.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.jwt_secret == DEV_SECRET {
            warnings.push(
                "JWT_SECRET is not set; tokens are signed with the built-in development secret"
                    .to_string(),
            );
        }
        if !self.environment.is_production() {
            return warnings;
        }
        if !self.hasher.is_salted() {
            warnings.push(
                "PASSWORD_HASHER=sha256 stores unsalted fast digests; use bcrypt for new deployments"
                    .to_string(),
            );
        }
        if self.database_url.is_none() {
            warnings.push(
                "DATABASE_URL is not set; accounts and tasks are kept in memory and lost on restart"
                    .to_string(),
            );
        }
        if self.allow_admin_registration {
            warnings.push("ALLOW_ADMIN_REGISTRATION lets anyone register as ADMIN".to_string());
        }
        warnings
    }

    pub fn log_warnings(&self) {
        for warning in self.warnings() {
            log::warn!("[{}] {}", self.environment, warning);
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
