#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

use clap::Parser;

mod cli;
mod config;
mod infra;
mod runtime;
mod settings;

use crate::cli::{Cli, Command};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    runtime::init_logging(cli.verbose)?;
    let settings = match cli.config.as_deref() {
        Some(path) => Settings::from_path(path),
        None => Settings::from_env(),
    };
    tracing::debug!(
        event = "settings_loaded",
        config_path = %settings.config_path.display(),
        data_dir = %settings.data_dir.display(),
        database = %settings.config.storage.database
    );

    match cli.command {
        Command::CreateUser(args) => crate::cli::create_user::run(&settings, &args).await,
        Command::Classify(args) => crate::cli::inspect::classify(&args),
        Command::Plan(args) => crate::cli::inspect::plan_calls(&settings, &args),
        Command::RenderScript(args) => crate::cli::script::run(&args),
    }
}
