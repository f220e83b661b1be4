use clap::Args;
use colored::Colorize as _;

use crate::app::AppContext;
use crate::cli::output::print_json;
use crate::error::{KkError, Result};
use crate::screen::{run_selftest, PatternDetector};

#[derive(Args, Debug)]
pub struct SelftestArgs {
    /// Show the outcome of every case, not just misses
    #[arg(long)]
    pub all: bool,
}

pub fn run(ctx: &AppContext, args: &SelftestArgs) -> Result<()> {
    let summary = run_selftest(&PatternDetector);

    if ctx.robot {
        print_json(&summary)?;
    } else {
        println!(
            "detector self-test: {}/{} cases caught",
            summary.caught, summary.total
        );
        for (tier, stats) in &summary.tiers {
            println!(
                "  tier {tier}: {}/{} ({:.0}%)",
                stats.caught,
                stats.total,
                stats.rate() * 100.0
            );
        }
        for case in &summary.cases {
            if case.caught && !args.all {
                continue;
            }
            let mark = if case.caught {
                "caught".green().to_string()
            } else {
                "missed".red().to_string()
            };
            println!("  [{mark}] tier {} {}", case.tier, case.id);
        }
        if !summary.blind_spots.is_empty() {
            println!("blind spots:");
            for spot in &summary.blind_spots {
                println!("  {spot}");
            }
        }
        for recommendation in &summary.recommendations {
            println!("note: {recommendation}");
        }
    }

    if !summary.passed {
        return Err(KkError::Invalid(
            "self-test thresholds not met (tier 1 must be 100%, tier 2 at least 80%)".to_string(),
        ));
    }
    Ok(())
}
