use clap::Args;

use mongo_provision_core::{plan, ProvisionError, VersionBucket};

use crate::cli::{print_json, USERNAME_ENV};
use crate::settings::Settings;

#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    /// Server version string, e.g. 3.6.1
    pub version: String,
}

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    pub version: String,
    #[arg(long, env = USERNAME_ENV)]
    pub username: String,
}

pub fn classify(args: &ClassifyArgs) -> anyhow::Result<()> {
    let bucket = VersionBucket::classify(&args.version);
    if !bucket.is_supported() {
        return Err(ProvisionError::UnsupportedVersion(args.version.clone()).into());
    }
    println!("{bucket}");
    Ok(())
}

pub fn plan_calls(settings: &Settings, args: &PlanArgs) -> anyhow::Result<()> {
    let plan = plan(&args.version, &args.username, &settings.target())?;
    print_json(&plan)
}
