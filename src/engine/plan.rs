//! engine::plan
//!
//! Deterministic stage plan generation.
//!
//! # Architecture
//!
//! A [`StagePlan`] is the manifest of every copy staging will perform. It
//! sits between resolved dependencies and the files written by the
//! [`Executor`](super::exec::Executor), which makes dry runs possible.
//!
//! Plans are:
//! - **Deterministic**: Same install trees always produce the same plan
//! - **Previewable**: Can be shown to the user before execution
//! - **Serializable**: Can be printed as JSON
//! - **Ordered**: Dependencies in resolution order, rules in declared order,
//!   files sorted by relative path within a rule
//!
//! # Invariants
//!
//! - Planning reads install trees but never writes anything
//! - A missing source subtree contributes zero operations, not an error
//! - Every file under a listed subtree is either planned, filtered out by
//!   the rule's pattern, or reported as an error; none is skipped silently
//!
//! # Example
//!
//! ```no_run
//! use ubistage::core::rules::default_rules;
//! use ubistage::engine::plan::plan_staging;
//! use ubistage::engine::resolve::PackageInstall;
//! use std::path::Path;
//!
//! let install = PackageInstall::new(
//!     "ubitrack/1.3.0@ubitrack/stable".parse().unwrap(),
//!     "/cache/ubitrack/1.3.0/ubitrack/stable",
//! );
//! let plan = plan_staging(&[install], &default_rules().unwrap(), Path::new("/work")).unwrap();
//! for op in plan.ops() {
//!     println!("{} -> {}", op.source.display(), op.dest.display());
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::resolve::PackageInstall;
use crate::core::rules::CopyRule;
use crate::core::types::PackageRef;

/// Errors from planning.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A source subtree exists but could not be listed.
    #[error("failed to list '{path}': {source}")]
    Listing {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file name cannot be matched against a rule pattern.
    #[error("file name is not valid UTF-8: '{path}'")]
    NonUtf8Name { path: PathBuf },

    /// The plan could not be serialized for its digest.
    #[error("failed to serialize stage plan: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// One file copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOp {
    /// Index of the rule in declared order.
    pub rule: usize,
    /// Path relative to the rule's source subtree, `/`-separated.
    pub relative: String,
    /// File to read.
    pub source: PathBuf,
    /// File to write.
    pub dest: PathBuf,
}

/// Every copy for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyPlan {
    /// The dependency being staged.
    pub package: PackageRef,
    /// Copies in execution order.
    pub ops: Vec<CopyOp>,
}

/// The full staging manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    /// Staging root.
    pub dest_root: PathBuf,
    /// Rules in declared order, rendered for display.
    pub rules: Vec<String>,
    /// Per-dependency copies in resolution order.
    pub dependencies: Vec<DependencyPlan>,
}

impl StagePlan {
    /// Check if the plan copies nothing.
    pub fn is_empty(&self) -> bool {
        self.dependencies.iter().all(|d| d.ops.is_empty())
    }

    /// Total number of copies.
    pub fn op_count(&self) -> usize {
        self.dependencies.iter().map(|d| d.ops.len()).sum()
    }

    /// All copies in execution order.
    pub fn ops(&self) -> impl Iterator<Item = &CopyOp> {
        self.dependencies.iter().flat_map(|d| d.ops.iter())
    }

    /// Planned copies per rule, summed over dependencies.
    pub fn per_rule(&self) -> Vec<usize> {
        let mut counts = vec![0; self.rules.len()];
        for op in self.ops() {
            if let Some(c) = counts.get_mut(op.rule) {
                *c += 1;
            }
        }
        counts
    }

    /// Compute a digest of the plan.
    ///
    /// The digest is a SHA-256 hash of the canonical JSON serialization,
    /// so identical inputs always produce the same digest.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Serialize`] if a path in the plan is not valid
    /// UTF-8 and so has no JSON form.
    pub fn digest(&self) -> Result<String, PlanError> {
        let json = serde_json::to_string(&self).map_err(PlanError::Serialize)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        let hash = hasher.finalize();
        Ok(format!("sha256:{}", hex::encode(hash)))
    }
}

/// Build the staging manifest.
///
/// For each dependency, for each rule in declared order, lists the regular
/// files under `<install>/<rule.src>` whose relative path matches the
/// rule's pattern. Each becomes a copy to `<dest_root>/<rule.dst>/<relative>`.
///
/// # Errors
///
/// Returns [`PlanError`] if an existing source subtree cannot be listed, or
/// if it holds a file whose relative path is not valid UTF-8.
pub fn plan_staging(
    resolved: &[PackageInstall],
    rules: &[CopyRule],
    dest_root: &Path,
) -> Result<StagePlan, PlanError> {
    let mut dependencies = Vec::with_capacity(resolved.len());

    for install in resolved {
        let mut ops = Vec::new();
        for (index, rule) in rules.iter().enumerate() {
            let source_dir = rule.source_dir(&install.root);
            let dest_dir = rule.dest_dir(dest_root);

            for relative in list_files(&source_dir)? {
                if !rule.matches(&relative) {
                    continue;
                }
                let source = join_relative(&source_dir, &relative);
                let dest = join_relative(&dest_dir, &relative);
                ops.push(CopyOp {
                    rule: index,
                    relative,
                    source,
                    dest,
                });
            }
        }

        tracing::debug!(dependency = %install.reference, copies = ops.len(), "planned");
        dependencies.push(DependencyPlan {
            package: install.reference.clone(),
            ops,
        });
    }

    Ok(StagePlan {
        dest_root: dest_root.to_path_buf(),
        rules: rules.iter().map(ToString::to_string).collect(),
        dependencies,
    })
}

/// List regular files below `dir`, as sorted `/`-separated relative paths.
///
/// A missing directory yields an empty list.
fn list_files(dir: &Path) -> Result<Vec<String>, PlanError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    walk(dir, &mut found)?;

    let mut files = Vec::with_capacity(found.len());
    for path in found {
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let parts = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PlanError::NonUtf8Name { path: path.clone() })?;
        files.push(parts.join("/"));
    }

    files.sort();
    Ok(files)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), PlanError> {
    let listing = |source: std::io::Error| PlanError::Listing {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(listing)? {
        let entry = entry.map_err(listing)?;
        let path = entry.path();
        if entry.file_type().map_err(listing)?.is_dir() {
            walk(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::default_rules;
    use std::fs;
    use tempfile::TempDir;

    fn install_at(root: &Path) -> PackageInstall {
        PackageInstall::new("ubitrack/1.3.0@ubitrack/stable".parse().unwrap(), root)
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    #[test]
    fn empty_install_plans_nothing() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let plan = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.per_rule(), vec![0; 6]);
        assert_eq!(plan.dependencies.len(), 1);
    }

    #[test]
    fn files_routed_by_rule() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        touch(&pkg.path().join("bin/utcore.dll"));
        touch(&pkg.path().join("bin/trackman"));
        touch(&pkg.path().join("lib/libutcore.so.1.3.0"));
        touch(&pkg.path().join("lib/libutcore.a"));
        touch(&pkg.path().join("lib/ubitrack/libutvision.dylib"));
        touch(&pkg.path().join("share/Ubitrack/utql/tracker.dfg"));

        let plan = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();

        assert_eq!(plan.per_rule(), vec![1, 0, 1, 1, 1, 1]);
        let dests: Vec<_> = plan.ops().map(|op| op.dest.clone()).collect();
        assert!(dests.contains(&dest.path().join("bin/utcore.dll")));
        assert!(dests.contains(&dest.path().join("lib/libutcore.so.1.3.0")));
        assert!(dests.contains(&dest.path().join("lib/ubitrack/libutvision.dylib")));
        assert!(dests.contains(&dest.path().join("share/Ubitrack/utql/tracker.dfg")));
        assert!(!dests.iter().any(|d| d.ends_with("trackman")));
    }

    #[test]
    fn ops_follow_declared_rule_order() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        touch(&pkg.path().join("bin/foo.dll"));
        touch(&pkg.path().join("lib/foo.dll"));

        let plan = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();

        let rules: Vec<_> = plan.ops().map(|op| op.rule).collect();
        assert_eq!(rules, vec![0, 1]);
        let first = &plan.dependencies[0].ops[0];
        let second = &plan.dependencies[0].ops[1];
        assert_eq!(first.dest, second.dest);
        assert_eq!(second.source, pkg.path().join("lib/foo.dll"));
    }

    #[test]
    fn planning_writes_nothing() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let staging = dest.path().join("stage");
        touch(&pkg.path().join("bin/utcore.dll"));

        let plan = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), &staging).unwrap();

        assert_eq!(plan.op_count(), 1);
        assert!(!staging.exists());
    }

    #[test]
    fn digest_is_stable() {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        touch(&pkg.path().join("lib/libutcore.so"));

        let a = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();
        let b = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap();

        let digest = a.digest().unwrap();
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest, b.digest().unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn digest_fails_for_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let staging = dest.path().join(OsStr::from_bytes(b"stage\xfe"));

        let plan = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), &staging).unwrap();

        assert!(matches!(plan.digest(), Err(PlanError::Serialize(_))));
    }

    #[test]
    fn hidden_and_nested_files_are_listed() {
        let pkg = TempDir::new().unwrap();
        touch(&pkg.path().join("lib/.hidden/libutcore.so"));
        touch(&pkg.path().join("lib/a/b/libutvision.so.1"));

        let files = list_files(&pkg.path().join("lib")).unwrap();

        assert_eq!(files, vec![".hidden/libutcore.so", "a/b/libutvision.so.1"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_file_name_is_an_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"libfoo\xff.so");
        let bad = pkg.path().join("lib").join(name);
        touch(&bad);

        let err = plan_staging(&[install_at(pkg.path())], &default_rules().unwrap(), dest.path()).unwrap_err();

        match err {
            PlanError::NonUtf8Name { path } => assert_eq!(path, bad),
            other => panic!("unexpected error: {other}"),
        }
    }
}
