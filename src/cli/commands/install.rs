use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{print_json, success};
use crate::error::Result;
use crate::install::{install, InstallOptions};

#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct InstallArgs {
    /// Skill name
    pub skill: String,

    /// Version (defaults to latest)
    pub version: Option<String>,
}

pub fn run(ctx: &AppContext, args: &InstallArgs) -> Result<()> {
    let index = ctx.load_index()?;
    let revocations = ctx.load_revocations()?;
    let public_key = ctx.public_key()?;
    let fetch = ctx.archive_fetcher()?;

    let outcome = install(&InstallOptions {
        name: &args.skill,
        version: args.version.as_deref(),
        index: &index,
        revocations: revocations.as_ref(),
        public_key: &public_key,
        skills_dir: ctx.skills_dir(),
        fetch: &fetch,
    })?;

    if ctx.robot {
        return print_json(&json!({
            "name": outcome.name,
            "version": outcome.version,
            "trust_level": outcome.trust_level,
            "install_dir": outcome.install_dir,
        }));
    }
    success(&format!(
        "installed {} {} ({}) to {}",
        outcome.name,
        outcome.version,
        outcome.trust_level,
        outcome.install_dir.display()
    ));
    Ok(())
}
