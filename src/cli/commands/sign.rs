use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::catalog::{update_index, SignedCatalogIndex};
use crate::cli::output::{print_json, success};
use crate::error::Result;
use crate::signing::{sha256_digest, sha256_hex};

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Archive to sign
    pub archive: PathBuf,

    /// Signed index to update in place with this archive's version
    pub index: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &SignArgs) -> Result<()> {
    let keypair = ctx.private_key()?;
    let bytes = std::fs::read(&args.archive)?;
    let sha256 = sha256_hex(&bytes);
    let signature = keypair.sign(&sha256_digest(&bytes));

    if let Some(index_path) = &args.index {
        let existing = SignedCatalogIndex::from_json(&std::fs::read_to_string(index_path)?)?;
        let updated = update_index(
            &existing,
            &args.archive,
            &keypair,
            &Utc::now().to_rfc3339(),
        )?;
        std::fs::write(index_path, updated.to_canonical_string()?)?;
        if ctx.robot {
            return print_json(&json!({
                "sha256": sha256,
                "signature": signature,
                "index": index_path,
            }));
        }
        success(&format!("signed and recorded in {}", index_path.display()));
        return Ok(());
    }

    if ctx.robot {
        return print_json(&json!({
            "sha256": sha256,
            "signature": signature,
            "size": bytes.len(),
        }));
    }
    println!("sha256    {sha256}");
    println!("signature {signature}");
    println!("size      {}", bytes.len());
    Ok(())
}
