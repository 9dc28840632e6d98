use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use mongo_provision_core::template::render_create_user_script;
use mongo_provision_core::Credentials;

use crate::cli::{resolve_username, PasswordArgs, USERNAME_ENV};

#[derive(Debug, Clone, Args)]
pub struct RenderScriptArgs {
    #[arg(long, env = USERNAME_ENV)]
    pub username: Option<String>,
    #[command(flatten)]
    pub password: PasswordArgs,
    /// Write to this file instead of stdout
    #[arg(long, short, value_name = "path")]
    pub out: Option<PathBuf>,
}

pub fn run(args: &RenderScriptArgs) -> anyhow::Result<()> {
    let username = resolve_username(args.username.as_deref())?;
    let password = args.password.resolve()?;
    let creds = Credentials::validated(username, password.as_str())?;
    let script = zeroize::Zeroizing::new(render_create_user_script(&creds)?);

    let Some(path) = args.out.as_deref() else {
        print!("{}", script.as_str());
        return Ok(());
    };
    fs::write(path, script.as_bytes())
        .with_context(|| format!("script write failed ({})", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("script chmod failed ({})", path.display()))?;
    }
    tracing::info!(event = "script_rendered", path = %path.display());
    Ok(())
}
