use clap::Args;
use colored::Colorize as _;

use crate::app::AppContext;
use crate::cli::output::{print_json, success};
use crate::error::Result;
use crate::install::{list_installed, update, InstallOptions, UpdateStatus};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Skill to update (all installed skills when omitted)
    pub skill: Option<String>,
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    let index = ctx.load_index()?;
    let revocations = ctx.load_revocations()?;
    let public_key = ctx.public_key()?;
    let fetch = ctx.archive_fetcher()?;

    let names: Vec<String> = match &args.skill {
        Some(name) => vec![name.clone()],
        None => list_installed(ctx.skills_dir(), None)?
            .into_iter()
            .map(|skill| skill.name)
            .collect(),
    };

    let mut statuses: Vec<UpdateStatus> = Vec::new();
    for name in &names {
        statuses.push(update(&InstallOptions {
            name: name.as_str(),
            version: None,
            index: &index,
            revocations: revocations.as_ref(),
            public_key: &public_key,
            skills_dir: ctx.skills_dir(),
            fetch: &fetch,
        })?);
    }

    if ctx.robot {
        return print_json(&statuses);
    }
    if statuses.is_empty() {
        println!("nothing installed to update");
        return Ok(());
    }
    for status in &statuses {
        if status.updated {
            success(&status.message);
            if status.config_preserved {
                println!("  {} user config preserved", "note".blue());
            }
        } else {
            println!("{}", status.message);
        }
    }
    Ok(())
}
