use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

pub mod create_user;
pub mod inspect;
pub mod script;

pub const USERNAME_ENV: &str = "MONGO_PROVISION_USERNAME";
pub const PASSWORD_ENV: &str = "MONGO_PROVISION_PASSWORD";

#[derive(Parser)]
#[command(name = "mongo-provision")]
#[command(about = "Create the storage user on a MongoDB server of any supported version")]
pub struct Cli {
    /// YAML config file (defaults to $MONGO_PROVISION_CONFIG, then mongo-provision.yaml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the application user on the configured server
    CreateUser(create_user::CreateUserArgs),
    /// Print the version bucket for a server version string
    Classify(inspect::ClassifyArgs),
    /// Print the calls that would run against a server version
    Plan(inspect::PlanArgs),
    /// Render create-user.js for use with the mongo shell
    RenderScript(script::RenderScriptArgs),
}

/// Password sources shared by commands that need one.
#[derive(Debug, Clone, Default, Args)]
pub struct PasswordArgs {
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long, value_name = "path", conflicts_with = "password")]
    pub password_file: Option<PathBuf>,
}

impl PasswordArgs {
    /// Flag, then file, then `MONGO_PROVISION_PASSWORD`, then an interactive prompt.
    pub fn resolve(&self) -> anyhow::Result<Zeroizing<String>> {
        if let Some(password) = self.password.as_ref() {
            return Ok(Zeroizing::new(password.clone()));
        }
        if let Some(path) = self.password_file.as_deref() {
            return read_password_file(path);
        }
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(Zeroizing::new(password));
        }
        prompt_password("Password: ")
    }
}

pub fn resolve_username(arg: Option<&str>) -> anyhow::Result<String> {
    if let Some(username) = arg {
        return Ok(username.to_string());
    }
    prompt_line("Username: ")
}

fn read_password_file(path: &Path) -> anyhow::Result<Zeroizing<String>> {
    let contents = Zeroizing::new(std::fs::read_to_string(path)?);
    let password = contents.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("password file is empty: {}", path.display());
    }
    Ok(Zeroizing::new(password.to_string()))
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    let mut input = String::new();
    eprint!("{prompt}");
    io::stderr().flush()?;
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_password(prompt: &str) -> anyhow::Result<Zeroizing<String>> {
    eprint!("{prompt}");
    io::stderr().flush()?;
    let password = Zeroizing::new(rpassword::read_password()?);
    if password.is_empty() {
        anyhow::bail!("password is required");
    }
    Ok(password)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
