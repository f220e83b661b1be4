//! CLI command implementations.
//!
//! Each subcommand has its own module with an Args struct and a
//! `run()` function.

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod build;
pub mod install;
pub mod keygen;
pub mod lint;
pub mod list;
pub mod revoke;
pub mod screen;
pub mod search;
pub mod selftest;
pub mod sign;
pub mod uninstall;
pub mod update;
pub mod verify;

/// Dispatch a command to its handler.
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Search(args) => search::run(ctx, args),
        Commands::Install(args) => install::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
        Commands::Uninstall(args) => uninstall::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Selftest(args) => selftest::run(ctx, args),
        Commands::Lint(args) => lint::run(ctx, args),
        Commands::Screen(args) => screen::run(ctx, args),
        Commands::Sign(args) => sign::run(ctx, args),
        Commands::Build(args) => build::run(ctx, args),
        Commands::Verify(args) => verify::run(ctx, args),
        Commands::Keygen(args) => keygen::run(ctx, args),
        Commands::Revoke(args) => revoke::run(ctx, args),
    }
}
