//! Builds an `AppConfig` from the config files and the environment.
//!
//! Sources are layered, later ones win:
//! 1. `config/base.toml`
//! 2. `config/{APP_ENVIRONMENT}.toml` (`local` if unset)
//! 3. `APP_` prefixed env variables, `__` separates nested keys, e.g. `APP_EMAIL_CONFIG__RECIPIENTS`
//! 4. `DATABASE_URL`, `EMAIL_ACCOUNT`, `EMAIL_PASSWORD` and `NOTIFICATION_RECIPIENTS`
//!
//! The config is resolved once at startup and handed to `App::build_from_config`.

mod error;
mod types;

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, CorsConfig, DbConfig, EmailConfig, Environment, NetConfig, SmtpTls};

/// Plain env variables that map directly onto a config key.
const ENV_OVERRIDES: [(&str, &str); 4] = [
    ("DATABASE_URL", "db_config.url"),
    ("EMAIL_ACCOUNT", "email_config.sender_addr"),
    ("EMAIL_PASSWORD", "email_config.password"),
    ("NOTIFICATION_RECIPIENTS", "email_config.recipients"),
];

impl AppConfig {
    /// Loads the configuration from the `config` directory in the current working directory.
    pub fn load() -> ConfigResult<Self> {
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()?;
        let config_dir = std::env::current_dir()?.join("config");

        Self::load_from(&config_dir, environment)
    }

    pub fn load_from(config_dir: &Path, environment: Environment) -> ConfigResult<Self> {
        info!(
            "{:<20} - Initializing the configuration for {}",
            "load_config",
            environment.as_ref()
        );
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut figment = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"));

        for (var, key) in ENV_OVERRIDES {
            figment = figment.merge(Env::raw().only(&[var]).map(move |_| key.into()));
        }

        let config = figment.extract()?;
        Ok(config)
    }
}
