use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{print_json, severity_tag, success};
use crate::error::{KkError, Result};
use crate::screen::lint_dir;

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Skill source directory to lint
    pub dir: PathBuf,

    /// Use the configured index for typosquat checks
    #[arg(long)]
    pub against_index: bool,
}

pub fn run(ctx: &AppContext, args: &LintArgs) -> Result<()> {
    let existing_names: Vec<String> = if args.against_index {
        ctx.load_index()?
            .skills
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    } else {
        Vec::new()
    };

    let result = lint_dir(&args.dir, &existing_names)?;

    if ctx.robot {
        print_json(&result)?;
    } else {
        for check in &result.checks {
            for finding in &check.findings {
                let location = match (&finding.file, finding.line) {
                    (Some(file), Some(line)) => format!("{file}:{line}: "),
                    (Some(file), None) => format!("{file}: "),
                    _ => String::new(),
                };
                println!(
                    "{} [{}] {location}{}",
                    severity_tag(finding.severity),
                    finding.check,
                    finding.message
                );
            }
        }
        println!(
            "{} error(s), {} warning(s), {} info in {}ms",
            result.score.errors, result.score.warnings, result.score.info, result.duration_ms
        );
        if result.pass {
            success("lint passed");
        }
    }

    if !result.pass {
        return Err(KkError::Invalid(format!(
            "lint failed with {} error(s)",
            result.score.errors
        )));
    }
    Ok(())
}
