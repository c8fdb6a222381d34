//! engine
//!
//! Orchestrates a recipe run: Overrides -> Resolve -> Plan -> Stage ->
//! Generate -> Build.
//!
//! # Architecture
//!
//! 1. **Overrides**: Apply the recipe's typed overrides to the option model
//! 2. **Resolve**: Locate every dependency's install tree
//! 3. **Plan**: List the copies staging will perform (no writes)
//! 4. **Stage**: Apply the plan through the single executor
//! 5. **Generate**: Write helper files into the staging root
//! 6. **Build**: Configure, build and install through the build driver
//!
//! # Invariants
//!
//! - Only the executor and generators write into the staging root
//! - Copy rules apply in declared order; later copies overwrite earlier ones
//! - Any failure ends the run; nothing is retried or rolled back
//!
//! # Example
//!
//! ```no_run
//! use ubistage::core::recipe::Recipe;
//! use ubistage::engine::driver::CMakeDriver;
//! use ubistage::engine::resolve::LocalCacheResolver;
//! use ubistage::engine::runner::Pipeline;
//! use ubistage::engine::run_build_sequence;
//! use std::path::Path;
//!
//! let recipe = Recipe::builtin(Path::new(".")).unwrap();
//! let resolver = LocalCacheResolver::new("/home/me/.ubistage/data");
//! let pipeline = Pipeline::new(&recipe, &resolver, Path::new("."));
//!
//! let staged = pipeline.stage().unwrap();
//! let mut driver = CMakeDriver::new("cmake", &recipe.source_dir, &recipe.build_dir, ".")
//!     .with_options(&staged.options);
//! run_build_sequence(&mut driver).unwrap();
//! ```

pub mod driver;
pub mod exec;
pub mod generators;
pub mod plan;
pub mod resolve;
pub mod runner;

// Re-exports for convenience
pub use driver::{run_build_sequence, BuildDriver, BuildStep, BuildStepError, CMakeDriver};
pub use exec::{stage_artifacts, Executor, StageError, StageReport};
pub use plan::{plan_staging, PlanError, StagePlan};
pub use resolve::{LocalCacheResolver, PackageInstall, PackageResolver, ResolutionError};
pub use runner::{run_recipe, Pipeline, PipelineError, RunOutcome, StagedTree};

use std::path::PathBuf;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Explicit recipe path.
    pub recipe: Option<PathBuf>,
}

impl Context {
    /// The effective working directory.
    pub fn cwd(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }
}
