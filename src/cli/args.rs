//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--recipe <path>`: Use this recipe file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ubistage - stage Ubitrack dependency artifacts and drive the CMake build
#[derive(Parser, Debug)]
#[command(name = "ubistage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if ubistage was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Recipe file (default: $UBISTAGE_RECIPE, ./ubistage.toml, built-in)
    #[arg(long, global = true)]
    pub recipe: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Where to stage and where packages come from.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StageTarget {
    /// Staging root (default: the working directory)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Package cache root (default: from config, or ~/.ubistage/data)
    #[arg(long, value_name = "DIR")]
    pub cache: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the files staging would copy, without copying
    #[command(
        name = "plan",
        long_about = "Show the files staging would copy, without copying.\n\n\
            Applies the recipe's option overrides, resolves every dependency in \
            the package cache and lists each copy the stage command would make, \
            grouped by dependency and rule. Nothing is written.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Preview staging into the working directory
    ubistage plan

    # Machine-readable plan, including its digest
    ubistage plan --json

    # Preview against another cache
    ubistage plan --cache /mnt/packages"
    )]
    Plan {
        #[command(flatten)]
        target: StageTarget,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy dependency artifacts into the staging root
    #[command(
        name = "stage",
        long_about = "Copy dependency artifacts into the staging root.\n\n\
            Applies the recipe's option overrides, resolves every dependency and \
            copies the files selected by the recipe's copy rules. Existing files \
            with the same name are overwritten; other files are left alone. \
            Generators run after the copies.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Stage into the working directory
    ubistage stage

    # Stage into a separate directory
    ubistage stage --dest /tmp/run

    # Per-rule counts as JSON
    ubistage stage --json"
    )]
    Stage {
        #[command(flatten)]
        target: StageTarget,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stage, then configure, build and install with CMake
    #[command(
        name = "install",
        long_about = "Stage, then configure, build and install with CMake.\n\n\
            Runs the full recipe: overrides, resolution, staging, generators, \
            then the CMake configure, build and install steps in that order. \
            The first failing step ends the run.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Full run
    ubistage install

    # Only stage and generate; skip CMake
    ubistage install --skip-build"
    )]
    Install {
        #[command(flatten)]
        target: StageTarget,

        /// Stop after staging and generators
        #[arg(long)]
        skip_build: bool,
    },

    /// Show the effective recipe
    #[command(name = "recipe")]
    Recipe {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    ubistage completion bash > ~/.local/share/bash-completion/completions/ubistage

    # Zsh
    ubistage completion zsh > ~/.zfunc/_ubistage

    # Fish
    ubistage completion fish > ~/.config/fish/completions/ubistage.fish

    # PowerShell
    ubistage completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
