use assert_cmd::Command;
use std::path::Path;

pub fn base_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mongo-provision"));
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT")
        .env_remove("MONGO_PROVISION_CONFIG")
        .env_remove("MONGO_PROVISION_URL")
        .env_remove("MONGO_PROVISION_DATABASE")
        .env_remove("MONGO_PROVISION_BACKEND")
        .env_remove("MONGO_PROVISION_SHELL")
        .env_remove("MONGO_PROVISION_DATA_DIR")
        .env_remove("MONGO_PROVISION_CREDENTIALS_FILE")
        .env_remove("MONGO_PROVISION_USERNAME")
        .env_remove("MONGO_PROVISION_PASSWORD");
    cmd
}
