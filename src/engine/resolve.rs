//! engine::resolve
//!
//! Locating dependency install trees.
//!
//! # Contract
//!
//! A [`PackageResolver`] turns references plus the applied option model into
//! [`PackageInstall`] handles, one per reference, in the given order. It must
//! fail fast with an identifying error when a reference cannot be found or an
//! override does not fit the target's option schema.
//!
//! # Local Cache
//!
//! [`LocalCacheResolver`] serves packages from a directory laid out as
//! `<cache>/<name>/<version>/<user>/<channel>/`. That directory is the
//! install tree. An optional `package.toml` declares the option schema:
//!
//! ```toml
//! [options]
//! opengl_extension_wrapper = ["glew", "glad"]
//! with_default_camera = "bool"
//! ```
//!
//! Packages without a manifest accept any option.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::options::{ConfigurationError, OptionModel, OptionValue};
use crate::core::paths::CachePaths;
use crate::core::types::{PackageName, PackageRef};

/// Errors from dependency resolution.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No install tree exists for the reference.
    #[error("package '{reference}' not found (looked in {path})")]
    NotFound { reference: String, path: PathBuf },

    /// An override does not fit the target's schema.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The package manifest could not be read or parsed.
    #[error("invalid manifest '{path}': {message}")]
    Manifest { path: PathBuf, message: String },
}

/// A dependency located on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInstall {
    /// The reference this install satisfies.
    pub reference: PackageRef,
    /// Root of the install tree (holds `bin/`, `lib/`, `share/Ubitrack/`).
    pub root: PathBuf,
}

impl PackageInstall {
    /// Create a handle for an install tree.
    pub fn new(reference: PackageRef, root: impl Into<PathBuf>) -> Self {
        Self {
            reference,
            root: root.into(),
        }
    }

    /// The package name.
    pub fn name(&self) -> &PackageName {
        &self.reference.name
    }

    /// Binaries subtree (may not exist).
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Libraries subtree (may not exist).
    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// Shared data subtree (may not exist).
    pub fn share_dir(&self) -> PathBuf {
        self.root.join("share").join("Ubitrack")
    }
}

/// Resolves references to install trees.
pub trait PackageResolver {
    /// Resolve every reference, validating the applied overrides.
    fn resolve(
        &self,
        references: &[PackageRef],
        options: &OptionModel,
    ) -> Result<Vec<PackageInstall>, ResolutionError>;
}

/// Declared type of one option in a package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OptionSpec {
    /// `"bool"` for a boolean, `"any"` for a free-form string.
    Kind(String),
    /// Enumerated allowed string values.
    OneOf(Vec<String>),
}

impl OptionSpec {
    fn accepts(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (OptionSpec::Kind(kind), OptionValue::Bool(_)) => kind == "bool",
            (OptionSpec::Kind(kind), OptionValue::Str(_)) => kind == "any",
            (OptionSpec::OneOf(allowed), OptionValue::Str(s)) => allowed.contains(s),
            (OptionSpec::OneOf(_), OptionValue::Bool(_)) => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            OptionSpec::Kind(kind) if kind == "bool" => "a boolean".to_string(),
            OptionSpec::Kind(_) => "a string".to_string(),
            OptionSpec::OneOf(allowed) => format!("one of: {}", allowed.join(", ")),
        }
    }
}

/// `package.toml` inside an install tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageManifest {
    /// Option schema: name to declared type.
    pub options: BTreeMap<String, OptionSpec>,
}

impl PackageManifest {
    /// Check that every forced option exists and accepts its value.
    pub fn check(
        &self,
        dependency: &PackageName,
        forced: &BTreeMap<String, OptionValue>,
    ) -> Result<(), ConfigurationError> {
        for (option, value) in forced {
            let spec = self
                .options
                .get(option)
                .ok_or_else(|| ConfigurationError::UnknownOption {
                    dependency: dependency.to_string(),
                    option: option.clone(),
                })?;
            if !spec.accepts(value) {
                return Err(ConfigurationError::InvalidValue {
                    dependency: dependency.to_string(),
                    option: option.clone(),
                    value: value.to_string(),
                    expected: spec.describe(),
                });
            }
        }
        Ok(())
    }
}

/// Resolver over an on-disk package cache.
#[derive(Debug, Clone)]
pub struct LocalCacheResolver {
    paths: CachePaths,
}

impl LocalCacheResolver {
    /// Create a resolver for the given cache root.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            paths: CachePaths::new(cache_root.into()),
        }
    }

    /// The cache root.
    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    fn read_manifest(&self, reference: &PackageRef) -> Result<Option<PackageManifest>, ResolutionError> {
        let path = self.paths.manifest_path(reference);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|e| ResolutionError::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let manifest = toml::from_str(&contents).map_err(|e| ResolutionError::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(manifest))
    }
}

impl PackageResolver for LocalCacheResolver {
    fn resolve(
        &self,
        references: &[PackageRef],
        options: &OptionModel,
    ) -> Result<Vec<PackageInstall>, ResolutionError> {
        let mut installs = Vec::with_capacity(references.len());

        for reference in references {
            let root = self.paths.package_dir(reference);
            if !root.is_dir() {
                return Err(ResolutionError::NotFound {
                    reference: reference.to_string(),
                    path: root,
                });
            }

            if let Some(forced) = options.options_for(&reference.name) {
                if let Some(manifest) = self.read_manifest(reference)? {
                    manifest.check(&reference.name, forced)?;
                }
            }

            tracing::debug!(dependency = %reference, root = %root.display(), "resolved");
            installs.push(PackageInstall::new(reference.clone(), root));
        }

        // Overrides aimed at packages nobody resolved cannot be honored
        for (dependency, option, _) in options.iter() {
            if !installs.iter().any(|i| i.name() == dependency) {
                return Err(ConfigurationError::UnknownOption {
                    dependency: dependency.to_string(),
                    option: option.to_string(),
                }
                .into());
            }
        }

        Ok(installs)
    }
}
