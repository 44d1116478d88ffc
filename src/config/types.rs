//! The configuration structs used to build the AppConfig, and their impls.
use std::{collections::HashSet, str::FromStr};

use axum::http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::{postgres::PgConnectOptions, ConnectOptions};
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};
use crate::web::types::ValidEmail;

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub db_config: DbConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DbConfig {
    /// postgres://{username}:{password}@{hostname}:{port}/{database}?{options}
    pub url: SecretString,
    pub max_connections: u32,
    pub acquire_timeout_millis: u64,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    #[default]
    Starttls,
    Tls,
    None,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_tls: SmtpTls,
    pub sender_addr: String,
    /// Used together with `sender_addr` as SMTP credentials. No auth if missing.
    pub password: Option<SecretString>,
    pub timeout_millis: u64,
    pub subject: String,
    /// Comma separated list of addresses that get notified about new applicants.
    pub recipients: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

// ###################################
// ->   IMPLs
// ###################################
impl EmailConfig {
    pub fn valid_sender(&self) -> ConfigResult<ValidEmail> {
        let addr = ValidEmail::parse(&self.sender_addr)
            .map_err(|er| ConfigError::InvalidEmail(er.to_string()))?;
        Ok(addr)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }

    /// Parses the configured recipients.
    /// Returns `None` if there are no recipients, which disables notifications.
    pub fn valid_recipients(&self) -> ConfigResult<Option<Vec<ValidEmail>>> {
        let Some(recipients) = self.recipients.as_deref() else {
            return Ok(None);
        };
        if recipients.trim().is_empty() {
            return Ok(None);
        }

        let recipients = recipients
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(|addr| {
                ValidEmail::parse(addr).map_err(|er| ConfigError::InvalidEmail(er.to_string()))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Some(recipients))
    }
}

impl DbConfig {
    pub fn connection_options(&self) -> ConfigResult<PgConnectOptions> {
        let opts = PgConnectOptions::from_str(self.url.expose_secret())
            .map_err(|er| ConfigError::InvalidDbUrl(er.to_string()))?
            .log_statements(tracing::log::LevelFilter::Trace);
        Ok(opts)
    }

    pub fn acquire_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.acquire_timeout_millis)
    }
}

impl CorsConfig {
    /// The allowed origins as a set of header values, ready to be compared against `Origin`.
    pub fn origin_set(&self) -> ConfigResult<HashSet<HeaderValue>> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
            })
            .collect()
    }
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}

// ###################################
// ->   TESTS
// ###################################
