use std::path::PathBuf;

use clap::Args;
use colored::Colorize as _;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::print_json;
use crate::error::{KkError, Result};
use crate::manifest::{SkillManifest, TrustLevel};
use crate::screen::review::build_review_context;
use crate::screen::{aggregate_risk, recommendation, PatternDetector, ReviewDetector, RiskLevel};

#[derive(Args, Debug)]
pub struct ScreenArgs {
    /// Skill source directory to screen
    pub dir: PathBuf,

    /// Trust level to assume for the recommendation
    #[arg(long, default_value = "community")]
    pub trust: String,

    /// Emit the external-reviewer context instead of running the
    /// packaged detector
    #[arg(long)]
    pub context: bool,
}

pub fn run(ctx: &AppContext, args: &ScreenArgs) -> Result<()> {
    let manifest_yaml = std::fs::read_to_string(args.dir.join("manifest.yaml"))?;
    let content = std::fs::read_to_string(args.dir.join("SKILL.md"))?;

    if args.context {
        let context = build_review_context(&manifest_yaml, &content);
        return print_json(&context);
    }

    let manifest = SkillManifest::from_yaml(&manifest_yaml)?;
    let trust = parse_trust(&args.trust)?;
    let findings = PatternDetector.detect(&manifest, &content);
    let risk = aggregate_risk(&findings);
    let advice = recommendation(risk, trust);

    if ctx.robot {
        return print_json(&json!({
            "risk": risk,
            "findings": findings,
            "recommendation": advice,
        }));
    }

    for finding in &findings {
        println!(
            "{} [{}] {} ({:?} confidence)",
            finding.severity.to_string().red(),
            finding.category,
            finding.description,
            finding.confidence
        );
        println!("    evidence: {}", finding.evidence.dimmed());
    }
    println!("risk: {risk}");
    println!("{advice}");

    if risk >= RiskLevel::High {
        return Err(KkError::Invalid(format!("screening found {risk} risk")));
    }
    Ok(())
}

fn parse_trust(input: &str) -> Result<TrustLevel> {
    match input {
        "first-party" => Ok(TrustLevel::FirstParty),
        "verified" => Ok(TrustLevel::Verified),
        "community" => Ok(TrustLevel::Community),
        other => Err(KkError::Invalid(format!(
            "trust must be first-party, verified, or community, got {other}"
        ))),
    }
}
