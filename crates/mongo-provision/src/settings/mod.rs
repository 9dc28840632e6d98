use std::env;
use std::path::{Path, PathBuf};

use mongo_provision_core::ProvisionTarget;

use crate::config::ProvisionConfig;

mod env_config;
#[cfg(test)]
mod tests;

pub const CONFIG_PATH_ENV: &str = "MONGO_PROVISION_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "mongo-provision.yaml";

#[derive(Debug)]
pub struct Settings {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub config: ProvisionConfig,
}

impl Settings {
    /// Loads the config file named by `MONGO_PROVISION_CONFIG`.
    #[must_use]
    pub fn from_env() -> Self {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(Path::new(&path))
    }

    #[must_use]
    pub fn from_path(config_path: &Path) -> Self {
        let mut config = env_config::load_config(config_path);
        env_config::apply_storage_env_overrides(&mut config);
        env_config::apply_backend_env_overrides(&mut config);
        env_config::apply_file_env_overrides(&mut config);
        let data_dir = config
            .stamps
            .data_dir
            .clone()
            .unwrap_or_else(default_data_dir);

        Self {
            config_path: config_path.to_path_buf(),
            data_dir,
            config,
        }
    }

    pub fn target(&self) -> ProvisionTarget {
        ProvisionTarget::with_database(self.config.storage.database.clone())
    }
}

fn default_data_dir() -> PathBuf {
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".thermostat").join("data")
}
