use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub max_upload_size: usize,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            max_upload_size: 10 * 1024 * 1024,
            tls_cert: None,
            tls_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Auth {
    pub token_validity_in_minutes: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Logger {
    pub directory: Option<String>,
    pub level: String,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            directory: None,
            level: "info".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Database {
    pub uri: String,
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            uri: "sqlite://annotator.db?mode=rwc".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub auth: Auth,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config_dir("config")
    }

    pub fn with_config_dir(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/{run_mode}")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/local")).required(false))
            .add_source(Environment::with_prefix("ANNOTATOR").separator("__"));

        builder.build()?.try_deserialize()
    }
}
