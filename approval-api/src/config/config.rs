use std::path::Path;

use ::config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "approval-api";
const ENV_PREFIX: &str = "APPROVALS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ids: IdsConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IdsConfig {
    pub machine_id: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MailConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    pub base_url: Option<String>,
    pub bucket: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KafkaConfig {
    pub bootstrap_servers: Option<String>,
    pub topic: String,
    pub message_timeout_ms: u64,
}

/// Defaults, then `approval-api.toml` if present, then `APPROVALS__*`
/// environment variables (e.g. `APPROVALS__SERVER__PORT=9090`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.hostname", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.max_upload_bytes", 10 * 1024 * 1024)?
        .set_default("ids.machine_id", 1)?
        .set_default("mail.from", "Gestión Humana <gestionhumana@merkahorro.com>")?
        .set_default("mail.timeout_ms", 10_000)?
        .set_default("storage.bucket", "documentos")?
        .set_default("database.max_connections", 5)?
        .set_default("kafka.topic", "perfiles.eventos")?
        .set_default("kafka.message_timeout_ms", 5_000)?;

    if Path::new(&format!("{}.toml", CONFIG_FILE)).exists() {
        builder = builder.add_source(File::with_name(CONFIG_FILE));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config: AppConfig = builder.build()?.try_deserialize()?;

    if config.server.port == 0 {
        return Err(ConfigError::ParseError("Invalid port: 0".to_string()));
    }
    if config.mail.timeout_ms == 0 {
        return Err(ConfigError::ParseError("Invalid mail timeout: 0".to_string()));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_any_source() {
        let config = load_config().unwrap();
        assert_eq!(config.server.hostname, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.bucket, "documentos");
        assert_eq!(config.mail.timeout_ms, 10_000);
    }
}
