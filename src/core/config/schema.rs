//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Tool Config
//!
//! Located at (in order of precedence):
//! 1. `$UBISTAGE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ubistage/config.toml`
//! 3. `~/.ubistage/config.toml`
//!
//! # Recipe File
//!
//! Located at `--recipe <path>`, `$UBISTAGE_RECIPE`, or `./ubistage.toml`.
//!
//! # Validation
//!
//! Unknown fields are rejected at parse time. Values are validated after
//! parsing (e.g., requirements must name distinct packages).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::options::OptionValue;
use crate::core::rules::CopyRule;
use crate::core::types::{PackageName, PackageRef};

/// Tool configuration (user scope).
///
/// # Example
///
/// ```toml
/// cache_dir = "/opt/ubistage/data"
/// cmake = "/usr/local/bin/cmake"
/// verbose = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Root of the local package cache
    pub cache_dir: Option<PathBuf>,

    /// CMake executable
    pub cmake: Option<String>,

    /// Verbose build output default
    pub verbose: Option<bool>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cmake) = &self.cmake {
            if cmake.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "cmake program cannot be empty".to_string(),
                ));
            }
        }
        if let Some(dir) = &self.cache_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "cache_dir cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Generators that write helper files into the staging root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// `stagebuildinfo.cmake` include file
    Cmake,
    /// `activate_run.sh` / `deactivate_run.sh` environment scripts
    Virtualenv,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Cmake => write!(f, "cmake"),
            GeneratorKind::Virtualenv => write!(f, "virtualenv"),
        }
    }
}

/// CMake build type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    /// Name as passed to `CMAKE_BUILD_TYPE` and `--config`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsSection {
    /// CMake build type (default: Release)
    pub build_type: Option<BuildType>,
}

/// Build driver section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// CMake source directory, relative to the recipe (default: ".")
    pub source_dir: Option<PathBuf>,

    /// CMake binary directory, relative to the recipe (default: "build")
    pub build_dir: Option<PathBuf>,

    /// Pass `--verbose` to the build step
    pub verbose: Option<bool>,
}

/// A recipe file as written on disk.
///
/// # Example
///
/// ```toml
/// name = "sinkgroup_test"
/// version = "0.1"
/// requires = ["ubitrack/1.3.0@ubitrack/stable"]
/// generators = ["cmake"]
///
/// [options.ubitrack]
/// with_default_camera = true
///
/// [[copy]]
/// src = "bin"
/// pattern = "*.dll"
/// dst = "bin"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RecipeFile {
    /// Name of the component being built
    pub name: String,

    /// Version of the component being built
    pub version: String,

    /// Direct requirements
    pub requires: Vec<PackageRef>,

    /// Packages pulled in by a requirement that overrides may target
    #[serde(default)]
    pub transitive: Vec<PackageRef>,

    /// Generators to run after staging
    #[serde(default)]
    pub generators: Vec<GeneratorKind>,

    /// Option overrides keyed by dependency name
    #[serde(default)]
    pub options: BTreeMap<PackageName, BTreeMap<String, OptionValue>>,

    /// Copy rules; the six default rules when absent
    #[serde(default)]
    pub copy: Option<Vec<CopyRule>>,

    /// Copy rules applied after `copy` (or the defaults)
    #[serde(default)]
    pub extra_copy: Vec<CopyRule>,

    /// Build settings
    #[serde(default)]
    pub settings: SettingsSection,

    /// Build driver settings
    #[serde(default)]
    pub build: BuildSection,
}

impl RecipeFile {
    /// Validate the recipe values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "recipe name cannot be empty".to_string(),
            ));
        }

        if self.requires.is_empty() {
            return Err(ConfigError::InvalidValue(
                "recipe must declare at least one requirement".to_string(),
            ));
        }

        // A package may appear once across requires and transitive
        let mut seen = BTreeSet::new();
        for reference in self.requires.iter().chain(&self.transitive) {
            if !seen.insert(reference.name.clone()) {
                return Err(ConfigError::InvalidValue(format!(
                    "package '{}' is declared more than once",
                    reference.name
                )));
            }
        }

        if let Some(rules) = &self.copy {
            if rules.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "copy rules cannot be an empty list; omit the key for the defaults".to_string(),
                ));
            }
        }

        let mut generators = BTreeSet::new();
        for generator in &self.generators {
            if !generators.insert(generator) {
                return Err(ConfigError::InvalidValue(format!(
                    "generator '{}' listed more than once",
                    generator
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.cache_dir.is_none());
            assert!(config.cmake.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn empty_cmake_rejected() {
            let config = GlobalConfig {
                cmake: Some("  ".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn reject_unknown_fields() {
            let result: Result<GlobalConfig, _> = toml::from_str("remote = \"origin\"");
            assert!(result.is_err());
        }
    }

    mod recipe_file {
        use super::*;

        fn minimal() -> RecipeFile {
            toml::from_str(
                r#"
                name = "sinkgroup_test"
                version = "0.1"
                requires = ["ubitrack/1.3.0@ubitrack/stable"]
                "#,
            )
            .unwrap()
        }

        #[test]
        fn minimal_recipe_is_valid() {
            let recipe = minimal();
            assert!(recipe.validate().is_ok());
            assert!(recipe.copy.is_none());
            assert!(recipe.generators.is_empty());
            assert_eq!(recipe.settings.build_type, None);
        }

        #[test]
        fn empty_requires_rejected() {
            let recipe = RecipeFile {
                requires: vec![],
                ..minimal()
            };
            assert!(recipe.validate().is_err());
        }

        #[test]
        fn duplicate_package_rejected() {
            let mut recipe = minimal();
            recipe
                .transitive
                .push("ubitrack/1.2.0@ubitrack/testing".parse().unwrap());
            assert!(recipe.validate().is_err());
        }

        #[test]
        fn extra_copy_parses_with_exclude() {
            let recipe: RecipeFile = toml::from_str(
                r#"
                name = "x"
                version = "0.1"
                requires = ["ubitrack/1.3.0@ubitrack/stable"]

                [[extra_copy]]
                src = "bin"
                pattern = "*"
                exclude = "*.dll"
                dst = "bin"
                "#,
            )
            .unwrap();
            assert!(recipe.validate().is_ok());
            assert!(recipe.copy.is_none());
            assert_eq!(recipe.extra_copy.len(), 1);
            assert_eq!(recipe.extra_copy[0].exclude(), Some("*.dll"));
        }

        #[test]
        fn empty_copy_list_rejected() {
            let recipe = RecipeFile {
                copy: Some(vec![]),
                ..minimal()
            };
            assert!(recipe.validate().is_err());
        }

        #[test]
        fn unknown_generator_rejected() {
            let result: Result<RecipeFile, _> = toml::from_str(
                r#"
                name = "x"
                version = "0.1"
                requires = ["ubitrack/1.3.0@ubitrack/stable"]
                generators = ["premake"]
                "#,
            );
            assert!(result.is_err());
        }

        #[test]
        fn bad_reference_rejected() {
            let result: Result<RecipeFile, _> = toml::from_str(
                r#"
                name = "x"
                version = "0.1"
                requires = ["ubitrack/1.3.0"]
                "#,
            );
            assert!(result.is_err());
        }

        #[test]
        fn parses_options_and_settings() {
            let recipe: RecipeFile = toml::from_str(
                r#"
                name = "x"
                version = "0.1"
                requires = ["ubitrack/1.3.0@ubitrack/stable"]

                [options.ubitrack]
                with_default_camera = true
                tracker = "art"

                [settings]
                build_type = "Debug"

                [build]
                build_dir = "out"
                verbose = false
                "#,
            )
            .unwrap();

            let opts = &recipe.options[&PackageName::new("ubitrack").unwrap()];
            assert_eq!(opts["with_default_camera"], OptionValue::Bool(true));
            assert_eq!(opts["tracker"], OptionValue::Str("art".into()));
            assert_eq!(recipe.settings.build_type, Some(BuildType::Debug));
            assert_eq!(recipe.build.build_dir, Some(PathBuf::from("out")));
        }

        #[test]
        fn reject_unknown_fields() {
            let result: Result<RecipeFile, _> = toml::from_str(
                r#"
                name = "x"
                version = "0.1"
                requires = ["ubitrack/1.3.0@ubitrack/stable"]
                short_paths = true
                "#,
            );
            assert!(result.is_err());
        }
    }
}
