use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use mongo_provision_core::constants::DEFAULT_TARGET_DATABASE;

use crate::config::{ProvisionConfig, StorageBackend, DEFAULT_STORAGE_URL};

pub(super) fn load_config(path: &Path) -> ProvisionConfig {
    if !path.exists() {
        return ProvisionConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path = %path.display(), error = %err);
            return ProvisionConfig::default();
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(mut config) => {
            validate_file_values(&mut config, path);
            config
        }
        Err(err) => {
            warn!(event = "config_parse_failed", path = %path.display(), error = %err);
            ProvisionConfig::default()
        }
    }
}

fn validate_file_values(config: &mut ProvisionConfig, path: &Path) {
    if !is_mongodb_url(&config.storage.url) {
        warn!(
            event = "config_invalid",
            path = %path.display(),
            field = "storage.url",
            value = %config.storage.url
        );
        config.storage.url = DEFAULT_STORAGE_URL.to_string();
    }
    if !is_database_name(&config.storage.database) {
        warn!(
            event = "config_invalid",
            path = %path.display(),
            field = "storage.database",
            value = %config.storage.database
        );
        config.storage.database = DEFAULT_TARGET_DATABASE.to_string();
    }
}

pub(super) fn apply_storage_env_overrides(config: &mut ProvisionConfig) {
    if let Ok(value) = env::var("MONGO_PROVISION_URL") {
        if is_mongodb_url(&value) {
            config.storage.url = value.trim().to_string();
        } else {
            warn!(event = "config_invalid", field = "MONGO_PROVISION_URL", value = %value);
        }
    }
    if let Ok(value) = env::var("MONGO_PROVISION_DATABASE") {
        if is_database_name(&value) {
            config.storage.database = value;
        } else {
            warn!(
                event = "config_invalid",
                field = "MONGO_PROVISION_DATABASE",
                value = %value
            );
        }
    }
}

pub(super) fn apply_backend_env_overrides(config: &mut ProvisionConfig) {
    if let Ok(value) = env::var("MONGO_PROVISION_BACKEND") {
        match StorageBackend::parse(&value) {
            Some(backend) => config.storage.backend = backend,
            None => warn!(
                event = "config_invalid",
                field = "MONGO_PROVISION_BACKEND",
                value = %value
            ),
        }
    }
    if let Ok(value) = env::var("MONGO_PROVISION_SHELL") {
        if value.trim().is_empty() {
            warn!(event = "config_invalid", field = "MONGO_PROVISION_SHELL", value = %value);
        } else {
            config.storage.shell = value.trim().to_string();
        }
    }
}

pub(super) fn apply_file_env_overrides(config: &mut ProvisionConfig) {
    if let Some(path) = non_empty_path("MONGO_PROVISION_DATA_DIR") {
        config.stamps.data_dir = Some(path);
    }
    if let Some(path) = non_empty_path("MONGO_PROVISION_CREDENTIALS_FILE") {
        config.credentials_file.path = Some(path);
    }
}

fn non_empty_path(field: &'static str) -> Option<PathBuf> {
    let value = env::var(field).ok()?;
    if value.trim().is_empty() {
        warn!(event = "config_invalid", field, value = %value);
        return None;
    }
    Some(PathBuf::from(value.trim()))
}

pub(super) fn is_mongodb_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("mongodb://") || value.starts_with("mongodb+srv://")
}

/// Names the server accepts for a database.
pub(super) fn is_database_name(value: &str) -> bool {
    !value.is_empty()
        && value.len() < 64
        && !value
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '/' | '\\' | '.' | '"' | '$' | '\0'))
}
