use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::error::{AppError, Result};

pub const CONFIG_FILE: &str = "visualizer.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub database_file: String,
    pub upload_dir: String,
    pub history_limit: i64,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
            database_file: "visualizer.db".to_string(),
            upload_dir: "uploads".to_string(),
            history_limit: 5,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base of the API, e.g. `http://127.0.0.1:8000/api/`
    pub base_url: String,
    pub upload_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            upload_timeout_secs: 60,
            request_timeout_secs: 15,
        }
    }
}

impl ClientConfig {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Loads configuration: defaults, then `visualizer.toml`, then env.
pub struct ConfigService {
    figment: Figment,
}

impl ConfigService {
    pub fn new() -> Self {
        // Missing .env is fine
        let _ = dotenvy::dotenv();
        Self::from_figment(Figment::new().merge(Toml::file(CONFIG_FILE)))
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn server(&self) -> Result<ServerConfig> {
        Figment::from(Serialized::defaults(ServerConfig::default()))
            .merge(self.figment.focus("server"))
            .merge(Env::prefixed("VISUALIZER_"))
            .extract()
            .map_err(|e| AppError::Internal(format!("Invalid server configuration: {e}")))
    }

    pub fn client(&self) -> Result<ClientConfig> {
        Figment::from(Serialized::defaults(ClientConfig::default()))
            .merge(self.figment.focus("client"))
            .merge(Env::prefixed("VISUALIZER_CLIENT_"))
            .extract()
            .map_err(|e| AppError::Internal(format!("Invalid client configuration: {e}")))
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
