//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the tool config and the effective recipe
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers never write into the staging root themselves.

mod completion;
mod install;
mod plan;
mod recipe;
mod session;
mod stage;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use install::install;
pub use plan::plan;
pub use recipe::recipe;
pub use stage::stage;

use crate::cli::args::Command;
use crate::engine::Context;
use anyhow::Result;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Plan { target, json } => plan::plan(ctx, &target, json),
        Command::Stage { target, json } => stage::stage(ctx, &target, json),
        Command::Install { target, skip_build } => install::install(ctx, &target, skip_build),
        Command::Recipe { json } => recipe::recipe(ctx, json),
        Command::Completion { shell } => completion::completion(shell),
    }
}
