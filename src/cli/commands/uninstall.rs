use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{print_json, success};
use crate::error::Result;
use crate::install::uninstall;

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Skill to remove
    pub skill: String,
}

pub fn run(ctx: &AppContext, args: &UninstallArgs) -> Result<()> {
    let outcome = uninstall(&args.skill, ctx.skills_dir())?;

    if ctx.robot {
        return print_json(&outcome);
    }
    if outcome.config_backed_up {
        success(&format!(
            "uninstalled {} (config backed up to .backups/{}/config.bak)",
            outcome.name, outcome.name
        ));
    } else {
        success(&format!("uninstalled {}", outcome.name));
    }
    Ok(())
}
