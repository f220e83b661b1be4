use clap::Args;
use colored::Colorize as _;

use crate::app::AppContext;
use crate::catalog::{search, SearchQuery};
use crate::cli::output::print_json;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to match against skill names and descriptions
    pub query: Option<String>,

    /// Require an exact tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Require a declared capability
    #[arg(long)]
    pub capability: Option<String>,
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let index = ctx.load_index()?;
    let hits = search(
        &index,
        &SearchQuery {
            text: args.query.clone(),
            tag: args.tag.clone(),
            capability: args.capability.clone(),
        },
    );

    if ctx.robot {
        return print_json(&hits);
    }
    if hits.is_empty() {
        println!("no skills matched");
        return Ok(());
    }
    for hit in hits {
        println!(
            "{} {} ({})  {}",
            hit.name.bold(),
            hit.version,
            hit.trust_level,
            hit.description
        );
    }
    Ok(())
}
