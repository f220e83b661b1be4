use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::print_json;
use crate::error::Result;
use crate::signing::Keypair;

#[derive(Args, Debug)]
pub struct KeygenArgs {}

pub fn run(ctx: &AppContext, _args: &KeygenArgs) -> Result<()> {
    let keypair = Keypair::generate()?;
    let private = keypair.to_base64();
    let public = keypair.public_key().to_base64();

    if ctx.robot {
        return print_json(&json!({
            "private_key": private,
            "public_key": public,
        }));
    }

    println!("KITHKIT_CATALOG_PRIVATE_KEY={private}");
    println!("KITHKIT_CATALOG_PUBLIC_KEY={public}");
    eprintln!("Keep the private key out of shell history and version control.");
    Ok(())
}
