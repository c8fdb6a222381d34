//! engine::exec
//!
//! The single staging executor.
//!
//! # Architecture
//!
//! The Executor is the only component that writes into the staging root.
//! It applies a [`StagePlan`] in order: dependencies in resolution order,
//! rules in declared order. Later copies to the same destination overwrite
//! earlier ones, which is how a `lib/*.dll` replaces a `bin/*.dll`.
//!
//! # Executor Contract
//!
//! The executor MUST:
//! 1. Create destination directories on demand
//! 2. Overwrite existing files of the same name
//! 3. Never delete files it did not write
//! 4. Stop at the first I/O failure, without undoing earlier copies
//! 5. Report how many files each rule copied, also on failure
//!
//! # Example
//!
//! ```no_run
//! use ubistage::core::rules::default_rules;
//! use ubistage::engine::exec::stage_artifacts;
//! use ubistage::engine::resolve::PackageInstall;
//! use std::path::Path;
//!
//! let install = PackageInstall::new(
//!     "ubitrack/1.3.0@ubitrack/stable".parse().unwrap(),
//!     "/cache/ubitrack/1.3.0/ubitrack/stable",
//! );
//! let report = stage_artifacts(&[install], &default_rules().unwrap(), Path::new("/work")).unwrap();
//! println!("copied {} file(s)", report.total());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::plan::{plan_staging, PlanError, StagePlan};
use super::resolve::PackageInstall;
use crate::core::rules::CopyRule;

/// Errors from staging.
#[derive(Debug, Error)]
pub enum StageError {
    /// A source subtree could not be listed.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A destination directory could not be created.
    #[error("failed to create '{path}' while staging {package}: {source}")]
    CreateDir {
        package: String,
        path: PathBuf,
        source: std::io::Error,
        /// Files copied before the failure.
        report: StageReport,
    },

    /// A file could not be copied.
    #[error("failed to copy '{from}' to '{to}' while staging {package}: {source}")]
    Copy {
        package: String,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
        /// Files copied before the failure.
        report: StageReport,
    },
}

impl StageError {
    /// The partial report, when the failure happened mid-copy.
    pub fn partial_report(&self) -> Option<&StageReport> {
        match self {
            StageError::Plan(_) => None,
            StageError::CreateDir { report, .. } | StageError::Copy { report, .. } => Some(report),
        }
    }
}

/// Copies performed for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// Dependency reference.
    pub package: String,
    /// Files copied by each rule, in declared order.
    pub copied: Vec<usize>,
}

/// Result of a staging pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Staging root.
    pub dest_root: PathBuf,
    /// Rules in declared order, rendered for display.
    pub rules: Vec<String>,
    /// Per-dependency counts, in staging order.
    pub dependencies: Vec<DependencyReport>,
}

impl StageReport {
    fn new(plan: &StagePlan) -> Self {
        Self {
            dest_root: plan.dest_root.clone(),
            rules: plan.rules.clone(),
            dependencies: Vec::new(),
        }
    }

    /// Files copied per rule, summed over dependencies.
    pub fn per_rule(&self) -> Vec<usize> {
        let mut counts = vec![0; self.rules.len()];
        for dep in &self.dependencies {
            for (slot, n) in counts.iter_mut().zip(&dep.copied) {
                *slot += n;
            }
        }
        counts
    }

    /// Total files copied.
    pub fn total(&self) -> usize {
        self.dependencies
            .iter()
            .flat_map(|d| d.copied.iter())
            .sum()
    }
}

/// The executor.
///
/// Applies stage plans to the filesystem.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }

    /// Execute a plan.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::CreateDir`] or [`StageError::Copy`] at the first
    /// failure. Both carry the report of the copies done so far.
    pub fn execute(&self, plan: &StagePlan) -> Result<StageReport, StageError> {
        let mut report = StageReport::new(plan);

        for dep in &plan.dependencies {
            let package = dep.package.to_string();
            report.dependencies.push(DependencyReport {
                package: package.clone(),
                copied: vec![0; plan.rules.len()],
            });

            for op in &dep.ops {
                if let Some(parent) = op.dest.parent() {
                    if let Err(source) = fs::create_dir_all(parent) {
                        return Err(StageError::CreateDir {
                            package,
                            path: parent.to_path_buf(),
                            source,
                            report,
                        });
                    }
                }

                if let Err(source) = fs::copy(&op.source, &op.dest) {
                    tracing::warn!(dependency = %package, from = %op.source.display(), "copy failed");
                    return Err(StageError::Copy {
                        package,
                        from: op.source.clone(),
                        to: op.dest.clone(),
                        source,
                        report,
                    });
                }
                tracing::debug!(dependency = %package, rule = op.rule, file = %op.relative, "copied");

                if let Some(count) = report
                    .dependencies
                    .last_mut()
                    .and_then(|d| d.copied.get_mut(op.rule))
                {
                    *count += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Stage the artifacts of resolved dependencies into `dest_root`.
///
/// Plans with [`plan_staging`] and applies the plan with [`Executor`].
pub fn stage_artifacts(
    resolved: &[PackageInstall],
    rules: &[CopyRule],
    dest_root: &Path,
) -> Result<StageReport, StageError> {
    let plan = plan_staging(resolved, rules, dest_root)?;
    let report = Executor::new().execute(&plan)?;
    tracing::info!(
        copied = report.total(),
        dependencies = report.dependencies.len(),
        "staged artifacts"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::default_rules;
    use tempfile::TempDir;

    fn install_at(root: &Path) -> PackageInstall {
        PackageInstall::new("ubitrack/1.3.0@ubitrack/stable".parse().unwrap(), root)
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn missing_subtrees_copy_nothing() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let report = stage_artifacts(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();

        assert_eq!(report.total(), 0);
        assert_eq!(report.per_rule(), vec![0; 6]);
    }

    #[test]
    fn later_rule_overwrites_earlier() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(&pkg.path().join("bin/foo.dll"), "from bin");
        write(&pkg.path().join("lib/foo.dll"), "from lib");

        let report = stage_artifacts(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();

        assert_eq!(report.per_rule()[..2], [1, 1]);
        let staged = fs::read_to_string(dest.path().join("bin/foo.dll")).unwrap();
        assert_eq!(staged, "from lib");
    }

    #[test]
    fn unrelated_files_survive() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(&pkg.path().join("lib/libutcore.so"), "new");
        write(&dest.path().join("lib/keep.txt"), "mine");
        write(&dest.path().join("lib/libutcore.so"), "old");

        stage_artifacts(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();

        assert_eq!(fs::read_to_string(dest.path().join("lib/keep.txt")).unwrap(), "mine");
        assert_eq!(fs::read_to_string(dest.path().join("lib/libutcore.so")).unwrap(), "new");
    }

    #[test]
    fn copy_failure_stops_with_partial_report() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(&pkg.path().join("bin/a.dll"), "a");
        write(&pkg.path().join("bin/b.dll"), "b");
        write(&pkg.path().join("lib/libc.so"), "c");
        // A directory where b.dll should land makes that copy fail
        fs::create_dir_all(dest.path().join("bin/b.dll")).unwrap();

        let err = stage_artifacts(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path())
            .unwrap_err();

        assert!(matches!(err, StageError::Copy { .. }));
        let partial = err.partial_report().unwrap();
        assert_eq!(partial.total(), 1);
        assert!(dest.path().join("bin/a.dll").is_file());
        assert!(!dest.path().join("lib/libc.so").exists());
    }

    #[test]
    fn dependencies_staged_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(&first.path().join("lib/libshared.so"), "first");
        write(&second.path().join("lib/libshared.so"), "second");

        let installs = vec![
            install_at(first.path()),
            PackageInstall::new(
                "ubitrack_tools_trackman/1.0@ubitrack/stable".parse().unwrap(),
                second.path(),
            ),
        ];
        let report = stage_artifacts(&installs, &default_rules().unwrap(), dest.path()).unwrap();

        assert_eq!(report.dependencies.len(), 2);
        assert_eq!(
            fs::read_to_string(dest.path().join("lib/libshared.so")).unwrap(),
            "second"
        );
    }
}
