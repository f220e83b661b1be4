use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::catalog::{
    create_revocation_list, RevocationEntry, RevocationSeverity, SignedRevocationList,
};
use crate::cli::output::{print_json, success};
use crate::error::{KkError, Result};

#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct RevokeArgs {
    /// Skill name to revoke
    pub skill: String,

    /// Exact version to revoke
    pub version: String,

    /// Revocation list file to create or extend
    pub list: PathBuf,

    /// Why this version is being revoked
    #[arg(long)]
    pub reason: String,

    /// critical, high, medium, or low
    #[arg(long, default_value = "high")]
    pub severity: String,
}

pub fn run(ctx: &AppContext, args: &RevokeArgs) -> Result<()> {
    let keypair = ctx.private_key()?;
    let severity = parse_severity(&args.severity)?;

    let mut entries = if args.list.exists() {
        SignedRevocationList::from_json(&std::fs::read_to_string(&args.list)?)?.entries
    } else {
        Vec::new()
    };

    if entries
        .iter()
        .any(|entry| entry.name == args.skill && entry.version == args.version)
    {
        return Err(KkError::Invalid(format!(
            "{} {} is already revoked",
            args.skill, args.version
        )));
    }

    entries.push(RevocationEntry {
        name: args.skill.clone(),
        version: args.version.clone(),
        reason: args.reason.clone(),
        revoked_at: Utc::now().to_rfc3339(),
        severity,
    });
    let list = create_revocation_list(entries, &keypair)?;
    std::fs::write(&args.list, list.to_canonical_string()?)?;

    if ctx.robot {
        return print_json(&json!({
            "revoked": {"name": args.skill, "version": args.version},
            "entries": list.entries.len(),
            "list": args.list,
        }));
    }
    success(&format!(
        "revoked {} {} ({} entries in {})",
        args.skill,
        args.version,
        list.entries.len(),
        args.list.display()
    ));
    Ok(())
}

fn parse_severity(input: &str) -> Result<RevocationSeverity> {
    match input {
        "critical" => Ok(RevocationSeverity::Critical),
        "high" => Ok(RevocationSeverity::High),
        "medium" => Ok(RevocationSeverity::Medium),
        "low" => Ok(RevocationSeverity::Low),
        other => Err(KkError::Invalid(format!(
            "severity must be critical, high, medium, or low, got {other}"
        ))),
    }
}
