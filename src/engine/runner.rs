//! engine::runner
//!
//! The recipe pipeline.
//!
//! # Lifecycle
//!
//! ```text
//! Overrides -> Resolve -> Plan -> Stage -> Generate -> Configure -> Build -> Install
//! ```
//!
//! Every phase must succeed before the next begins. There are no retries;
//! the first error ends the run. Configuration errors, whether found
//! locally or reported by the resolver, always surface before any build
//! step runs.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::driver::{run_build_sequence, BuildDriver, BuildStepError};
use super::exec::{Executor, StageError, StageReport};
use super::generators::{run_generators, GeneratorError};
use super::plan::{plan_staging, StagePlan};
use super::resolve::{PackageInstall, PackageResolver, ResolutionError};
use crate::core::options::{ConfigurationError, OptionModel};
use crate::core::paths::StagingPaths;
use crate::core::recipe::Recipe;
use crate::core::types::{PackageRef, RunId, UtcTimestamp};

/// Errors from the pipeline, one variant per failure class.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An override does not fit its target.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A dependency could not be resolved.
    #[error("resolution error: {0}")]
    Resolution(ResolutionError),

    /// Staging failed part-way.
    #[error("staging error: {0}")]
    Staging(#[from] StageError),

    /// A generator could not write its output.
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// A build step failed; later steps did not run.
    #[error("build error: {0}")]
    BuildStep(#[from] BuildStepError),
}

impl From<ResolutionError> for PipelineError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Configuration(e) => PipelineError::Configuration(e),
            other => PipelineError::Resolution(other),
        }
    }
}

/// Outcome of the staging phases.
#[derive(Debug)]
pub struct StagedTree {
    /// Applied option model.
    pub options: OptionModel,
    /// Resolved dependencies, in staging order.
    pub installs: Vec<PackageInstall>,
    /// Files copied.
    pub report: StageReport,
    /// Files written by generators.
    pub generated: Vec<PathBuf>,
}

/// Outcome of a full run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Identifier for log correlation.
    pub run_id: RunId,
    /// When the run started.
    pub started_at: UtcTimestamp,
    /// When the run finished.
    pub finished_at: UtcTimestamp,
    /// Staging results.
    pub staged: StagedTree,
}

/// A recipe bound to a resolver and a staging root.
pub struct Pipeline<'a> {
    recipe: &'a Recipe,
    resolver: &'a dyn PackageResolver,
    staging: StagingPaths,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline staging into `dest_root`.
    pub fn new(recipe: &'a Recipe, resolver: &'a dyn PackageResolver, dest_root: &Path) -> Self {
        Self {
            recipe,
            resolver,
            staging: StagingPaths::new(dest_root.to_path_buf()),
        }
    }

    /// The staging layout.
    pub fn staging(&self) -> &StagingPaths {
        &self.staging
    }

    /// Apply the recipe's overrides to a fresh option model.
    pub fn configure_options(&self) -> Result<OptionModel, PipelineError> {
        let mut model = self.recipe.option_model();
        model.apply_configuration_overrides(&self.recipe.overrides)?;
        Ok(model)
    }

    /// Resolve every reference of the recipe.
    pub fn resolve(&self, options: &OptionModel) -> Result<Vec<PackageInstall>, PipelineError> {
        let references: Vec<PackageRef> = self.recipe.references().cloned().collect();
        Ok(self.resolver.resolve(&references, options)?)
    }

    /// Compute the stage plan without writing anything.
    pub fn plan(&self) -> Result<StagePlan, PipelineError> {
        let options = self.configure_options()?;
        let installs = self.resolve(&options)?;
        let plan = plan_staging(&installs, &self.recipe.rules, self.staging.root())
            .map_err(StageError::from)?;
        Ok(plan)
    }

    /// Apply overrides, resolve, stage and generate. No build.
    pub fn stage(&self) -> Result<StagedTree, PipelineError> {
        let options = self.configure_options()?;
        tracing::info!(overrides = self.recipe.overrides.len(), "options configured");

        let installs = self.resolve(&options)?;
        tracing::info!(dependencies = installs.len(), "dependencies resolved");

        let plan = plan_staging(&installs, &self.recipe.rules, self.staging.root())
            .map_err(StageError::from)?;
        let digest = plan.digest().map_err(StageError::from)?;
        tracing::debug!(digest = %digest, copies = plan.op_count(), "stage plan ready");
        let report = Executor::new().execute(&plan)?;
        tracing::info!(copied = report.total(), "artifacts staged");

        let generated = run_generators(&self.recipe.generators, &installs, &self.staging)?;

        Ok(StagedTree {
            options,
            installs,
            report,
            generated,
        })
    }

    /// Stage, then run configure / build / install through `driver`.
    pub fn run(&self, driver: &mut dyn BuildDriver) -> Result<RunOutcome, PipelineError> {
        let run_id = RunId::new();
        let started_at = UtcTimestamp::now();
        tracing::info!(run = %run_id, recipe = %self.recipe.name, "run started");

        let staged = self.stage()?;
        run_build_sequence(driver)?;

        tracing::info!(run = %run_id, "run finished");
        Ok(RunOutcome {
            run_id,
            started_at,
            finished_at: UtcTimestamp::now(),
            staged,
        })
    }
}

/// Run a recipe end to end.
pub fn run_recipe(
    recipe: &Recipe,
    resolver: &dyn PackageResolver,
    dest_root: &Path,
    driver: &mut dyn BuildDriver,
) -> Result<RunOutcome, PipelineError> {
    Pipeline::new(recipe, resolver, dest_root).run(driver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionOverride;
    use crate::core::types::PackageName;
    use crate::engine::driver::BuildStep;
    use std::cell::RefCell;

    /// Resolver that serves nothing and counts calls.
    #[derive(Default)]
    struct NullResolver {
        calls: RefCell<usize>,
    }

    impl PackageResolver for NullResolver {
        fn resolve(
            &self,
            _references: &[PackageRef],
            _options: &OptionModel,
        ) -> Result<Vec<PackageInstall>, ResolutionError> {
            *self.calls.borrow_mut() += 1;
            Err(ResolutionError::NotFound {
                reference: "ubitrack/1.3.0@ubitrack/stable".into(),
                path: PathBuf::from("/nowhere"),
            })
        }
    }

    #[derive(Default)]
    struct CountingDriver {
        calls: Vec<BuildStep>,
    }

    impl BuildDriver for CountingDriver {
        fn configure(&mut self) -> Result<(), BuildStepError> {
            self.calls.push(BuildStep::Configure);
            Ok(())
        }
        fn build(&mut self) -> Result<(), BuildStepError> {
            self.calls.push(BuildStep::Build);
            Ok(())
        }
        fn install(&mut self) -> Result<(), BuildStepError> {
            self.calls.push(BuildStep::Install);
            Ok(())
        }
    }

    #[test]
    fn unknown_override_target_stops_before_resolution() {
        let mut recipe = Recipe::builtin(Path::new(".")).unwrap();
        recipe.overrides.push(OptionOverride::new(
            PackageName::new("opencv").unwrap(),
            "with_cuda",
            true,
        ));

        let resolver = NullResolver::default();
        let mut driver = CountingDriver::default();
        let err = run_recipe(&recipe, &resolver, Path::new("/unused"), &mut driver).unwrap_err();

        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(*resolver.calls.borrow(), 0);
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn resolution_failure_skips_build() {
        let recipe = Recipe::builtin(Path::new(".")).unwrap();
        let resolver = NullResolver::default();
        let mut driver = CountingDriver::default();

        let err = run_recipe(&recipe, &resolver, Path::new("/unused"), &mut driver).unwrap_err();

        assert!(matches!(err, PipelineError::Resolution(_)));
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn resolver_configuration_errors_are_reclassified() {
        let err: PipelineError = ResolutionError::Configuration(ConfigurationError::UnknownOption {
            dependency: "ubitrack".into(),
            option: "with_camera".into(),
        })
        .into();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
