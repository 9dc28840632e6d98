use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use mongo_provision_core::constants::DEFAULT_TARGET_DATABASE;

pub const DEFAULT_STORAGE_URL: &str = "mongodb://127.0.0.1:27518";
pub const DEFAULT_SHELL: &str = "mongo";
pub const DEFAULT_CREDENTIALS_COMMENT: &str = "Backing storage connection credentials.";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvisionConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub stamps: StampsConfig,
    #[serde(default)]
    pub credentials_file: CredentialsFileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_url")]
    pub url: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub backend: StorageBackend,
    /// `mongo` shell executable used by the shell backend.
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub app_name: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: default_storage_url(),
            database: default_database(),
            backend: StorageBackend::default(),
            shell: default_shell(),
            app_name: None,
        }
    }
}

/// How user-management calls reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Pipes a script into the `mongo` shell. Works with every supported server.
    #[default]
    Shell,
    /// Native driver. Needs MongoDB 4.4 or newer on the wire.
    Driver,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shell" => Some(Self::Shell),
            "driver" => Some(Self::Driver),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StampsConfig {
    /// Falls back to `$HOME/.thermostat/data`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsFileConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_credentials_comment")]
    pub comment: String,
}

impl Default for CredentialsFileConfig {
    fn default() -> Self {
        Self {
            path: None,
            comment: default_credentials_comment(),
        }
    }
}

fn default_storage_url() -> String {
    DEFAULT_STORAGE_URL.to_string()
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

fn default_database() -> String {
    DEFAULT_TARGET_DATABASE.to_string()
}

fn default_credentials_comment() -> String {
    DEFAULT_CREDENTIALS_COMMENT.to_string()
}
