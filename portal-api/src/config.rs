use std::str::FromStr;

use serde::Deserialize;
use serde_with::serde_as;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use strum::{Display, EnumString};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub store: StoreSettings,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub app_url: String,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct StoreSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub backend: StoreBackend,
}

/// Where phases are persisted.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum StoreBackend {
    #[strum(ascii_case_insensitive, serialize = "postgres")]
    Postgres,
    #[strum(ascii_case_insensitive, serialize = "memory")]
    Memory,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .expect("Failed to parse APP_ENVIRONMENT");
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("PORTAL")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!(StoreBackend::from_str("Memory").unwrap(), StoreBackend::Memory);
        assert_eq!(
            StoreBackend::from_str("postgres").unwrap(),
            StoreBackend::Postgres
        );
        assert!(StoreBackend::from_str("sqlite").is_err());
    }

    #[test]
    fn settings_deserialize_from_layered_sources() {
        let settings = config::Config::builder()
            .set_default("application.port", "8080")
            .unwrap()
            .set_default("application.host", "127.0.0.1")
            .unwrap()
            .set_default("application.app_url", "http://localhost:5173")
            .unwrap()
            .set_default("database.username", "postgres")
            .unwrap()
            .set_default("database.password", "password")
            .unwrap()
            .set_default("database.port", "5432")
            .unwrap()
            .set_default("database.host", "localhost")
            .unwrap()
            .set_default("database.database_name", "portal")
            .unwrap()
            .set_default("database.require_ssl", false)
            .unwrap()
            .set_default("store.backend", "memory")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();

        assert_eq!(settings.application.port, 8080);
        assert_eq!(settings.database.port, 5432);
        assert_eq!(settings.store.backend, StoreBackend::Memory);
    }
}
