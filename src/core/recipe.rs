//! core::recipe
//!
//! The effective recipe: what to resolve, which options to force, which
//! files to stage and how to drive the build.
//!
//! A [`Recipe`] is produced from a validated [`RecipeFile`]. Relative
//! directories are resolved against the directory the recipe was loaded
//! from. When no recipe file exists the built-in `sinkgroup_test` recipe
//! ([`BUILTIN_RECIPE`]) applies.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::config::schema::{BuildType, GeneratorKind, RecipeFile};
use super::config::ConfigError;
use super::options::{OptionModel, OptionOverride};
use super::rules::{default_rules, CopyRule};
use super::types::{PackageName, PackageRef};

/// The `sinkgroup_test` recipe, used when no recipe file is found.
pub const BUILTIN_RECIPE: &str = r#"name = "sinkgroup_test"
version = "0.1"
requires = [
    "ubitrack/1.3.0@ubitrack/stable",
    "ubitrack_component_vision_aruco/1.3.0@ubitrack/stable",
    "ubitrack_tools_trackman/1.0@ubitrack/stable",
]
transitive = ["ubitrack_vision/1.3.0@ubitrack/stable"]
generators = ["cmake", "virtualenv"]

[options.ubitrack_vision]
opengl_extension_wrapper = "glad"

[options.ubitrack]
with_default_camera = true

[[extra_copy]]
src = "bin"
pattern = "*"
exclude = "*.dll"
dst = "bin"

[[extra_copy]]
src = "bin"
pattern = "log4cpp.conf"
dst = "."

[settings]
build_type = "Release"

[build]
source_dir = "."
build_dir = "build"
verbose = true
"#;

/// A validated, ready-to-run recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    /// Component name.
    pub name: String,
    /// Component version.
    pub version: String,
    /// Direct requirements, in declared order.
    pub requires: Vec<PackageRef>,
    /// Transitive packages overrides may target.
    pub transitive: Vec<PackageRef>,
    /// Typed option overrides, in declared order.
    pub overrides: Vec<OptionOverride>,
    /// Copy rules, in declared order: the base rules, then the extras.
    pub rules: Vec<CopyRule>,
    /// Generators to run after staging.
    pub generators: Vec<GeneratorKind>,
    /// CMake build type.
    pub build_type: BuildType,
    /// CMake source directory.
    pub source_dir: PathBuf,
    /// CMake binary directory.
    pub build_dir: PathBuf,
    /// Verbose build output.
    pub verbose: bool,
}

impl Recipe {
    /// Build a recipe from a parsed file.
    ///
    /// `base_dir` anchors relative `source_dir` and `build_dir` values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the file fails validation.
    pub fn from_file(file: RecipeFile, base_dir: &Path) -> Result<Self, ConfigError> {
        file.validate()?;

        let overrides = file
            .options
            .iter()
            .flat_map(|(dependency, options)| {
                options.iter().map(move |(option, value)| {
                    OptionOverride::new(dependency.clone(), option.clone(), value.clone())
                })
            })
            .collect();

        let anchor = |p: Option<PathBuf>, default: &str| {
            let p = p.unwrap_or_else(|| PathBuf::from(default));
            if p.is_absolute() {
                p
            } else {
                base_dir.join(p)
            }
        };

        let mut rules = match file.copy {
            Some(rules) => rules,
            None => default_rules().map_err(|e| ConfigError::InvalidValue(e.to_string()))?,
        };
        rules.extend(file.extra_copy);

        Ok(Self {
            name: file.name,
            version: file.version,
            requires: file.requires,
            transitive: file.transitive,
            overrides,
            rules,
            generators: file.generators,
            build_type: file.settings.build_type.unwrap_or_default(),
            source_dir: anchor(file.build.source_dir, "."),
            build_dir: anchor(file.build.build_dir, "build"),
            verbose: file.build.verbose.unwrap_or(true),
        })
    }

    /// The built-in `sinkgroup_test` recipe, anchored at `base_dir`.
    pub fn builtin(base_dir: &Path) -> Result<Self, ConfigError> {
        let file: RecipeFile =
            toml::from_str(BUILTIN_RECIPE).map_err(|e| ConfigError::ParseError {
                path: PathBuf::from("<builtin>"),
                message: e.to_string(),
            })?;
        Self::from_file(file, base_dir)
    }

    /// Names overrides may target: requirements plus transitive packages.
    pub fn scope(&self) -> Vec<PackageName> {
        self.references().map(|r| r.name.clone()).collect()
    }

    /// Every reference to resolve, requirements first.
    pub fn references(&self) -> impl Iterator<Item = &PackageRef> {
        self.requires.iter().chain(&self.transitive)
    }

    /// An empty option model over this recipe's scope.
    pub fn option_model(&self) -> OptionModel {
        OptionModel::new(self.scope())
    }
}
