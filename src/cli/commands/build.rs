use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::catalog::build_index;
use crate::cli::output::{print_json, success};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory of archives: {dir}/{skill}/{skill}-{version}.tar.gz
    pub archives_dir: PathBuf,

    /// Where to write the signed index (stdout when omitted)
    pub index_out: Option<PathBuf>,

    /// Timestamp to stamp into the index (defaults to now; fixed
    /// timestamps make builds reproducible)
    #[arg(long)]
    pub updated: Option<String>,
}

pub fn run(ctx: &AppContext, args: &BuildArgs) -> Result<()> {
    let keypair = ctx.private_key()?;
    let updated = args
        .updated
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    let index = build_index(&args.archives_dir, &keypair, &updated)?;
    let serialized = index.to_canonical_string()?;

    match &args.index_out {
        Some(path) => {
            std::fs::write(path, &serialized)?;
            if ctx.robot {
                print_json(&json!({
                    "index": path,
                    "skills": index.skills.len(),
                    "updated": index.updated,
                }))?;
            } else {
                success(&format!(
                    "wrote index with {} skill(s) to {}",
                    index.skills.len(),
                    path.display()
                ));
            }
        }
        None => println!("{serialized}"),
    }
    Ok(())
}
