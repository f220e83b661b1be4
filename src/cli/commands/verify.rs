use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::catalog::{verify_index, verify_revocation_list, SignedCatalogIndex, SignedRevocationList};
use crate::cli::output::{print_json, success};
use crate::error::{KkError, Result};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signed index document to verify
    pub index: PathBuf,

    /// Signed revocation list to verify alongside the index
    #[arg(long)]
    pub revocations: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &VerifyArgs) -> Result<()> {
    let public = ctx.public_key()?;
    let index = SignedCatalogIndex::from_json(&std::fs::read_to_string(&args.index)?)?;
    if !verify_index(&index, &public) {
        return Err(KkError::Integrity(format!(
            "index signature verification failed: {}",
            args.index.display()
        )));
    }

    let mut revocations_checked = false;
    if let Some(path) = &args.revocations {
        let list = SignedRevocationList::from_json(&std::fs::read_to_string(path)?)?;
        if !verify_revocation_list(&list, &public) {
            return Err(KkError::Integrity(format!(
                "revocation list signature verification failed: {}",
                path.display()
            )));
        }
        revocations_checked = true;
    }

    if ctx.robot {
        return print_json(&json!({
            "verified": true,
            "skills": index.skills.len(),
            "updated": index.updated,
            "revocations_checked": revocations_checked,
        }));
    }
    success(&format!(
        "index verified: {} skill(s), updated {}",
        index.skills.len(),
        index.updated
    ));
    if revocations_checked {
        success("revocation list verified");
    }
    Ok(())
}
