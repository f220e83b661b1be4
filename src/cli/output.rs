//! Output helpers shared by command handlers.

use colored::Colorize as _;
use serde::Serialize;

use crate::error::Result;
use crate::screen::Severity;

/// Print a value as pretty JSON (robot mode).
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Success line for humans.
pub fn success(message: &str) {
    println!("{} {message}", "ok".green().bold());
}

/// Severity tag with the conventional colors.
pub fn severity_tag(severity: Severity) -> String {
    match severity {
        Severity::Error => "error".red().bold().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Info => "info".blue().to_string(),
    }
}
