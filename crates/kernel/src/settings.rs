use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use comic_back_db::ConnectOptions;
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "COMIC_ENV";
const CONFIG_DIR_ENV: &str = "COMIC_CONFIG_DIR";
const ENV_PREFIX: &str = "COMIC";

// Connection variables shared with the comic-back service.
const MONGO_URL_ENV: &str = "MONGO_URL";
const MONGO_USR_ENV: &str = "MONGO_USR";
const MONGO_PWD_ENV: &str = "MONGO_PWD";

/// Deployment environment the bootstrap is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        match name {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay
    /// and process environment.
    pub fn load(config_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir =
            config_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .with_context(|| "unable to resolve current directory")?,
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let mut settings = Self::from_builder(builder)?;
        settings.environment = Environment::parse(&environment)?;
        settings
            .database
            .apply_service_env(|key| std::env::var(key).ok());

        Ok(settings)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        cfg.try_deserialize()
            .with_context(|| "failed to deserialize configuration")
    }
}

#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_uri")]
    pub uri: String,
    #[serde(default = "DatabaseSettings::default_app_name")]
    pub app_name: String,
    #[serde(default = "DatabaseSettings::default_server_selection_timeout_ms")]
    pub server_selection_timeout_ms: u64,
    /// Kept out of the URI so reserved characters need no encoding.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "DatabaseSettings::default_auth_source")]
    pub auth_source: String,
}

impl DatabaseSettings {
    fn default_uri() -> String {
        "mongodb://127.0.0.1:27017".to_string()
    }

    fn default_app_name() -> String {
        "comic-back-init".to_string()
    }

    fn default_server_selection_timeout_ms() -> u64 {
        10000
    }

    fn default_auth_source() -> String {
        "admin".to_string()
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            app_name: self.app_name.clone(),
            server_selection_timeout: self.server_selection_timeout(),
            username: self.username.clone(),
            password: self.password.clone(),
            auth_source: Some(self.auth_source.clone()),
        }
    }

    /// Replace the URI with the hosted-cluster form when `MONGO_URL` is set.
    pub fn apply_service_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(MONGO_URL_ENV).filter(|host| !host.is_empty()) {
            let user = lookup(MONGO_USR_ENV).unwrap_or_default();
            let password = lookup(MONGO_PWD_ENV).unwrap_or_default();
            self.uri = srv_uri(&user, &password, &host);
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            app_name: Self::default_app_name(),
            server_selection_timeout_ms: Self::default_server_selection_timeout_ms(),
            username: None,
            password: None,
            auth_source: Self::default_auth_source(),
        }
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("uri", &comic_back_db::redact_uri(&self.uri))
            .field("app_name", &self.app_name)
            .field("server_selection_timeout_ms", &self.server_selection_timeout_ms)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("auth_source", &self.auth_source)
            .finish()
    }
}

fn srv_uri(user: &str, password: &str, host: &str) -> String {
    format!("mongodb+srv://{user}:{password}@{host}/?retryWrites=true&w=majority")
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "TelemetrySettings::default_level")]
    pub level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl TelemetrySettings {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
