use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use mongo_provision_core::{plan, Credentials, ProvisionReport, Provisioner, UserStore};

use crate::cli::{print_json, resolve_username, PasswordArgs, USERNAME_ENV};
use crate::config::StorageBackend;
use crate::infra::credentials_file::write_credentials_file;
use crate::infra::mongo::MongoUserStore;
use crate::infra::shell::MongoShellStore;
use crate::infra::stamps::StampFiles;
use crate::settings::Settings;

#[derive(Debug, Clone, Args)]
pub struct CreateUserArgs {
    #[arg(long, env = USERNAME_ENV)]
    pub username: Option<String>,
    #[command(flatten)]
    pub password: PasswordArgs,
    /// Skip asking the server and treat the server as this version
    #[arg(long, value_name = "version")]
    pub server_version: Option<String>,
    /// Print the planned calls without touching the server
    #[arg(long)]
    pub dry_run: bool,
    /// Run even if a previous setup left its stamp file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct CreateUserOutput<'a> {
    #[serde(flatten)]
    report: &'a ProvisionReport,
    credentials_file: Option<String>,
    stamp: String,
}

pub async fn run(settings: &Settings, args: &CreateUserArgs) -> anyhow::Result<()> {
    let stamps = StampFiles::new(&settings.data_dir);
    if stamps.user_done_exists() && !args.force && !args.dry_run {
        println!(
            "MongoDB user setup already done ({}); pass --force to run again",
            stamps.user_done_path().display()
        );
        return Ok(());
    }

    let username = resolve_username(args.username.as_deref())?;
    if args.dry_run {
        return dry_run(settings, args, &username).await;
    }
    if let Some(version) = args.server_version.as_deref() {
        plan(version, &username, &settings.target())?;
    }
    let password = args.password.resolve()?;
    let creds = Credentials::validated(username, password.as_str())?;
    let version = args.server_version.as_deref();

    let output = match settings.config.storage.backend {
        StorageBackend::Shell => {
            let mut store = shell_store(settings);
            setup(settings, &mut store, version, &creds, &stamps).await?
        }
        StorageBackend::Driver => {
            let mut store = connect(settings).await?;
            setup(settings, &mut store, version, &creds, &stamps).await?
        }
    };
    print_json(&output)
}

/// Unlocks, provisions and records the result; on failure every stamp is
/// removed again.
async fn setup<S>(
    settings: &Settings,
    store: &mut S,
    server_version: Option<&str>,
    creds: &Credentials,
    stamps: &StampFiles,
) -> anyhow::Result<serde_json::Value>
where
    S: UserStore + ?Sized,
{
    stamps.unlock().with_context(|| {
        format!("stamp write failed ({})", stamps.setup_complete_path().display())
    })?;
    match provision_and_record(settings, store, server_version, creds, stamps).await {
        Ok(output) => Ok(output),
        Err(err) => {
            tracing::error!(event = "create_user_failed", error = %err);
            if let Err(clear_err) = stamps.clear() {
                tracing::warn!(event = "stamp_cleanup_failed", error = %clear_err);
            }
            Err(err)
        }
    }
}

async fn provision_and_record<S>(
    settings: &Settings,
    store: &mut S,
    server_version: Option<&str>,
    creds: &Credentials,
    stamps: &StampFiles,
) -> anyhow::Result<serde_json::Value>
where
    S: UserStore + ?Sized,
{
    let provisioner = Provisioner::new(settings.target());
    let report = match server_version {
        Some(version) => {
            provisioner
                .provision_with_version(store, version, creds)
                .await?
        }
        None => provisioner.provision(store, creds).await?,
    };

    let credentials_file = match settings.config.credentials_file.path.as_deref() {
        Some(path) => {
            write_credentials_file(path, creds, &settings.config.credentials_file.comment)?;
            Some(path.to_path_buf())
        }
        None => None,
    };
    if let Err(err) = record_stamps(stamps, credentials_file.is_some()) {
        if let Some(path) = credentials_file.as_deref() {
            remove_credentials_file(path);
        }
        return Err(err);
    }

    let output = CreateUserOutput {
        report: &report,
        credentials_file: credentials_file.map(|path| path.display().to_string()),
        stamp: stamps.user_done_path().display().to_string(),
    };
    Ok(serde_json::to_value(output)?)
}

fn record_stamps(stamps: &StampFiles, has_credentials_file: bool) -> anyhow::Result<()> {
    stamps
        .create_user_done()
        .with_context(|| format!("stamp write failed ({})", stamps.user_done_path().display()))?;
    // With a credentials file the web user setup still has to run and
    // finalizes the stamp itself.
    if !has_credentials_file {
        stamps.complete().with_context(|| {
            format!("stamp write failed ({})", stamps.setup_complete_path().display())
        })?;
    }
    Ok(())
}

fn remove_credentials_file(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        tracing::warn!(
            event = "credentials_cleanup_failed",
            path = %path.display(),
            error = %err
        );
    }
}

async fn dry_run(settings: &Settings, args: &CreateUserArgs, username: &str) -> anyhow::Result<()> {
    let version = match args.server_version.clone() {
        Some(version) => version,
        None => match settings.config.storage.backend {
            StorageBackend::Shell => shell_store(settings).current_version_string().await?,
            StorageBackend::Driver => connect(settings).await?.current_version_string().await?,
        },
    };
    let plan = plan(&version, username, &settings.target())?;
    print_json(&plan)
}

fn shell_store(settings: &Settings) -> MongoShellStore {
    let storage = &settings.config.storage;
    let store = MongoShellStore::for_url(&storage.shell, &storage.url, &storage.database);
    tracing::info!(
        event = "storage_shell",
        program = %storage.shell,
        address = %redact_url(store.address())
    );
    store
}

async fn connect(settings: &Settings) -> anyhow::Result<MongoUserStore> {
    let storage = &settings.config.storage;
    tracing::info!(
        event = "storage_connect",
        url = %redact_url(&storage.url),
        database = %storage.database
    );
    MongoUserStore::connect(&storage.url, storage.app_name.as_deref())
        .await
        .with_context(|| format!("storage connect failed ({})", redact_url(&storage.url)))
}

/// Drops any `user:password@` section so URLs can be logged.
pub(crate) fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}
