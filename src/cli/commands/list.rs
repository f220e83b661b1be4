use clap::Args;
use colored::Colorize as _;

use crate::app::AppContext;
use crate::catalog::{check_installed, RevocationEntry};
use crate::cli::output::print_json;
use crate::error::Result;
use crate::install::list_installed;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Skip the index lookup (no update information)
    #[arg(long)]
    pub offline: bool,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    // The index is optional here: listing must work without a
    // reachable catalog.
    let index = if args.offline {
        None
    } else {
        ctx.load_index().ok()
    };

    let installed = list_installed(ctx.skills_dir(), index.as_ref())?;

    // Report (never enforce) revocations against what is installed.
    let pairs: Vec<(String, String)> = installed
        .iter()
        .map(|skill| (skill.name.clone(), skill.version.clone()))
        .collect();
    let revoked: Vec<RevocationEntry> = match ctx.load_revocations() {
        Ok(Some(list)) => check_installed(&list, &pairs)
            .into_iter()
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    if ctx.robot {
        return print_json(&serde_json::json!({
            "installed": installed,
            "revoked": revoked,
        }));
    }
    if installed.is_empty() {
        println!("no skills installed");
        return Ok(());
    }
    for skill in &installed {
        let update_note = match (skill.has_update, &skill.latest_version) {
            (Some(true), Some(latest)) => format!("  {} {latest} available", "update".yellow()),
            _ => String::new(),
        };
        println!(
            "{} {} ({}){update_note}",
            skill.name.bold(),
            skill.version,
            skill.trust_level
        );
    }
    for entry in &revoked {
        println!(
            "{} {} {} is revoked: {} (severity: {})",
            "warning".yellow().bold(),
            entry.name,
            entry.version,
            entry.reason,
            entry.severity
        );
    }
    Ok(())
}
