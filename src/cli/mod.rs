//! CLI definitions: clap v4 derive, one subcommand module per command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// kithkit - signed skill registry client and catalog tools
#[derive(Parser, Debug)]
#[command(name = "kithkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/kithkit/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the catalog index
    Search(commands::search::SearchArgs),

    /// Install a skill from the catalog
    Install(commands::install::InstallArgs),

    /// Update one or all installed skills
    Update(commands::update::UpdateArgs),

    /// Uninstall a skill (backs up its config first)
    Uninstall(commands::uninstall::UninstallArgs),

    /// List installed skills
    List(commands::list::ListArgs),

    /// Run the detector self-test suite
    Selftest(commands::selftest::SelftestArgs),

    /// Lint a skill source directory
    Lint(commands::lint::LintArgs),

    /// Run the pattern detector over a skill and report risk
    Screen(commands::screen::ScreenArgs),

    /// Sign an archive, optionally updating an index in place
    Sign(commands::sign::SignArgs),

    /// Build a signed index from an archives directory
    Build(commands::build::BuildArgs),

    /// Verify a signed index (and revocation list, when configured)
    Verify(commands::verify::VerifyArgs),

    /// Generate an Ed25519 catalog keypair
    Keygen(commands::keygen::KeygenArgs),

    /// Revoke a skill version in a signed revocation list
    Revoke(commands::revoke::RevokeArgs),
}
