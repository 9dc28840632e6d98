use super::*;
use std::sync::Mutex;

use crate::config::StorageBackend;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    env::remove_var("MONGO_PROVISION_URL");
    env::remove_var("MONGO_PROVISION_DATABASE");
    env::remove_var("MONGO_PROVISION_DATA_DIR");
    env::remove_var("MONGO_PROVISION_CREDENTIALS_FILE");
    env::remove_var("MONGO_PROVISION_BACKEND");
    env::remove_var("MONGO_PROVISION_SHELL");
    env::remove_var(CONFIG_PATH_ENV);
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("temp config");
    std::fs::write(file.path(), contents).expect("write config");
    file
}

#[test]
fn missing_config_file_yields_defaults() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    let settings = Settings::from_path(Path::new("/nonexistent/mongo-provision.yaml"));
    assert_eq!(settings.config.storage.url, "mongodb://127.0.0.1:27518");
    assert_eq!(settings.config.storage.database, "thermostat");
    assert!(settings.config.credentials_file.path.is_none());
    assert_eq!(settings.config.storage.backend, StorageBackend::Shell);
    assert_eq!(settings.config.storage.shell, "mongo");
    assert!(settings.data_dir.ends_with(".thermostat/data"));
    assert_eq!(settings.target().database, "thermostat");
    assert_eq!(settings.target().admin_username, "thermostat-admin");
}

#[test]
fn config_file_values_are_loaded() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    let file = write_config(concat!(
        "storage:\n",
        "  url: mongodb://db.internal:27017\n",
        "  database: metrics\n",
        "  backend: driver\n",
        "  shell: /opt/mongodb/bin/mongo\n",
        "stamps:\n",
        "  data_dir: /var/lib/thermostat\n",
        "credentials_file:\n",
        "  path: /etc/thermostat/web.auth\n",
    ));
    let settings = Settings::from_path(file.path());
    assert_eq!(settings.config.storage.url, "mongodb://db.internal:27017");
    assert_eq!(settings.target().database, "metrics");
    assert_eq!(settings.config.storage.backend, StorageBackend::Driver);
    assert_eq!(settings.config.storage.shell, "/opt/mongodb/bin/mongo");
    assert_eq!(settings.data_dir, PathBuf::from("/var/lib/thermostat"));
    assert_eq!(
        settings.config.credentials_file.path,
        Some(PathBuf::from("/etc/thermostat/web.auth"))
    );
    assert_eq!(
        settings.config.credentials_file.comment,
        "Backing storage connection credentials."
    );
}

#[test]
fn unparsable_config_falls_back_to_defaults() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    let file = write_config("storage: [not, a, map\n");
    let settings = Settings::from_path(file.path());
    assert_eq!(settings.config.storage.database, "thermostat");
}

#[test]
fn invalid_file_values_fall_back_to_defaults() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    let file = write_config("storage:\n  url: http://db:27017\n  database: bad.name\n");
    let settings = Settings::from_path(file.path());
    assert_eq!(settings.config.storage.url, "mongodb://127.0.0.1:27518");
    assert_eq!(settings.config.storage.database, "thermostat");
    assert_eq!(settings.target().database, "thermostat");
}

#[test]
fn backend_env_overrides() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    env::set_var("MONGO_PROVISION_BACKEND", "Driver");
    env::set_var("MONGO_PROVISION_SHELL", "/usr/local/bin/mongo");
    let settings = Settings::from_path(Path::new("/nonexistent/mongo-provision.yaml"));
    env::set_var("MONGO_PROVISION_BACKEND", "odbc");
    env::set_var("MONGO_PROVISION_SHELL", " ");
    let fallback = Settings::from_path(Path::new("/nonexistent/mongo-provision.yaml"));
    clear_env();
    assert_eq!(settings.config.storage.backend, StorageBackend::Driver);
    assert_eq!(settings.config.storage.shell, "/usr/local/bin/mongo");
    assert_eq!(fallback.config.storage.backend, StorageBackend::Shell);
    assert_eq!(fallback.config.storage.shell, "mongo");
}

#[test]
fn env_overrides_take_precedence() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    let file = write_config("storage:\n  database: metrics\n");
    env::set_var("MONGO_PROVISION_URL", "mongodb://override:1234");
    env::set_var("MONGO_PROVISION_DATABASE", "override");
    env::set_var("MONGO_PROVISION_DATA_DIR", "/tmp/stamps");
    env::set_var("MONGO_PROVISION_CREDENTIALS_FILE", "/tmp/web.auth");
    let settings = Settings::from_path(file.path());
    clear_env();
    assert_eq!(settings.config.storage.url, "mongodb://override:1234");
    assert_eq!(settings.config.storage.database, "override");
    assert_eq!(settings.data_dir, PathBuf::from("/tmp/stamps"));
    assert_eq!(
        settings.config.credentials_file.path,
        Some(PathBuf::from("/tmp/web.auth"))
    );
}

#[test]
fn invalid_env_values_are_ignored() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    env::set_var("MONGO_PROVISION_URL", "postgres://localhost/thermostat");
    env::set_var("MONGO_PROVISION_DATABASE", "bad.name");
    env::set_var("MONGO_PROVISION_DATA_DIR", "  ");
    let settings = Settings::from_path(Path::new("/nonexistent/mongo-provision.yaml"));
    clear_env();
    assert_eq!(settings.config.storage.url, "mongodb://127.0.0.1:27518");
    assert_eq!(settings.config.storage.database, "thermostat");
    assert!(settings.config.stamps.data_dir.is_none());
}

#[test]
fn from_env_reads_config_path_variable() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    clear_env();
    let file = write_config("storage:\n  database: fromenv\n");
    env::set_var(CONFIG_PATH_ENV, file.path());
    let settings = Settings::from_env();
    clear_env();
    assert_eq!(settings.config_path, file.path());
    assert_eq!(settings.config.storage.database, "fromenv");
}

#[test]
fn database_name_rules() {
    assert!(env_config::is_database_name("thermostat"));
    assert!(env_config::is_database_name("thermostat_test-1"));
    assert!(!env_config::is_database_name(""));
    assert!(!env_config::is_database_name("a b"));
    assert!(!env_config::is_database_name("a/b"));
    assert!(!env_config::is_database_name(&"x".repeat(64)));
}

#[test]
fn mongodb_url_rules() {
    assert!(env_config::is_mongodb_url("mongodb://127.0.0.1:27518"));
    assert!(env_config::is_mongodb_url("mongodb+srv://cluster.example.com"));
    assert!(!env_config::is_mongodb_url("http://127.0.0.1:27518"));
}
