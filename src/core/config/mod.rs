//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! ubistage has two configuration scopes:
//! - **Tool**: User-level settings (package cache, CMake executable)
//! - **Recipe**: Project-level description of what to stage and build
//!
//! # Tool Config Locations
//!
//! Searched in order:
//! 1. `$UBISTAGE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ubistage/config.toml`
//! 3. `~/.ubistage/config.toml`
//!
//! # Recipe Locations
//!
//! Searched in order:
//! 1. An explicit path (`--recipe`)
//! 2. `$UBISTAGE_RECIPE` if set
//! 3. `ubistage.toml` in the working directory
//!
//! If none exists, the built-in `sinkgroup_test` recipe is used.
//!
//! # Example
//!
//! ```no_run
//! use ubistage::core::config::{load_recipe, Config};
//! use std::path::Path;
//!
//! let config = Config::load().unwrap();
//! println!("Package cache: {}", config.cache_dir().unwrap().display());
//!
//! let loaded = load_recipe(None, Path::new(".")).unwrap();
//! println!("Recipe: {} ({})", loaded.recipe.name, loaded.source);
//! ```

pub mod schema;

pub use schema::{BuildType, GeneratorKind, GlobalConfig, RecipeFile};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::recipe::Recipe;

/// Name of the project recipe file.
pub const RECIPE_FILE_NAME: &str = "ubistage.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("recipe file not found: {0}")]
    RecipeNotFound(PathBuf),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Tool configuration with defaults applied by accessor methods.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Tool configuration
    pub global: GlobalConfig,
    /// Path to the tool config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load tool configuration from default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        let (global, global_path) = Self::load_global()?;
        global.validate()?;
        Ok(Self {
            global,
            global_path,
        })
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $UBISTAGE_CONFIG
        if let Ok(path) = std::env::var("UBISTAGE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/ubistage/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ubistage/config.toml");
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.ubistage/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".ubistage/config.toml");
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the package cache root.
    ///
    /// Defaults to `~/.ubistage/data` if not configured.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.global.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
                Ok(home.join(".ubistage/data"))
            }
        }
    }

    /// Get the CMake executable.
    ///
    /// Defaults to "cmake" if not configured.
    pub fn cmake(&self) -> &str {
        self.global.cmake.as_deref().unwrap_or("cmake")
    }

    /// Verbose build override, if configured.
    pub fn verbose(&self) -> Option<bool> {
        self.global.verbose
    }

    /// Get the path to the loaded tool config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

/// Where the effective recipe came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeSource {
    /// Loaded from a file on disk.
    File(PathBuf),
    /// The built-in `sinkgroup_test` recipe.
    BuiltIn,
}

impl fmt::Display for RecipeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeSource::File(path) => write!(f, "{}", path.display()),
            RecipeSource::BuiltIn => write!(f, "built-in"),
        }
    }
}

/// Result of loading a recipe.
#[derive(Debug)]
pub struct RecipeLoadResult {
    /// The validated recipe.
    pub recipe: Recipe,
    /// Where it was loaded from.
    pub source: RecipeSource,
}

/// Load the effective recipe.
///
/// An explicit path must exist. Otherwise `$UBISTAGE_RECIPE` and
/// `<cwd>/ubistage.toml` are tried before falling back to the built-in
/// recipe anchored at `cwd`.
///
/// # Errors
///
/// Returns an error if the explicit path is missing, or a recipe file
/// cannot be read, parsed, or validated.
pub fn load_recipe(explicit: Option<&Path>, cwd: &Path) -> Result<RecipeLoadResult, ConfigError> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        if !path.exists() {
            return Err(ConfigError::RecipeNotFound(path));
        }
        return load_recipe_file(&path);
    }

    if let Ok(path) = std::env::var("UBISTAGE_RECIPE") {
        let path = PathBuf::from(path);
        if path.exists() {
            return load_recipe_file(&path);
        }
    }

    let local = cwd.join(RECIPE_FILE_NAME);
    if local.exists() {
        return load_recipe_file(&local);
    }

    Ok(RecipeLoadResult {
        recipe: Recipe::builtin(cwd)?,
        source: RecipeSource::BuiltIn,
    })
}

fn load_recipe_file(path: &Path) -> Result<RecipeLoadResult, ConfigError> {
    let file: RecipeFile = read_toml(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let recipe = Recipe::from_file(file, base_dir)?;
    Ok(RecipeLoadResult {
        recipe,
        source: RecipeSource::File(path.to_path_buf()),
    })
}

/// Read and parse a TOML file.
fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_unconfigured() {
        let config = Config::default();
        assert_eq!(config.cmake(), "cmake");
        assert!(config.verbose().is_none());
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn configured_values_win() {
        let config = Config {
            global: GlobalConfig {
                cache_dir: Some(PathBuf::from("/opt/cache")),
                cmake: Some("/usr/bin/cmake3".to_string()),
                verbose: Some(false),
            },
            global_path: None,
        };

        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/opt/cache"));
        assert_eq!(config.cmake(), "/usr/bin/cmake3");
        assert_eq!(config.verbose(), Some(false));
    }

    #[test]
    fn load_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "cmake = \"cmake3\"\n").unwrap();

        std::env::set_var("UBISTAGE_CONFIG", config_path.to_str().unwrap());
        let config = Config::load();
        std::env::remove_var("UBISTAGE_CONFIG");

        let config = config.unwrap();
        assert_eq!(config.cmake(), "cmake3");
        assert_eq!(config.loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn builtin_recipe_when_no_file() {
        let temp = TempDir::new().unwrap();
        let loaded = load_recipe(None, temp.path()).unwrap();
        assert_eq!(loaded.source, RecipeSource::BuiltIn);
        assert_eq!(loaded.recipe.name, "sinkgroup_test");
    }

    #[test]
    fn local_recipe_file_wins_over_builtin() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(RECIPE_FILE_NAME),
            r#"
            name = "other"
            version = "2.0"
            requires = ["ubitrack/1.3.0@ubitrack/stable"]
            "#,
        )
        .unwrap();

        let loaded = load_recipe(None, temp.path()).unwrap();
        assert_eq!(loaded.recipe.name, "other");
        assert_eq!(
            loaded.source,
            RecipeSource::File(temp.path().join(RECIPE_FILE_NAME))
        );
        assert_eq!(loaded.recipe.build_dir, temp.path().join("build"));
    }

    #[test]
    fn explicit_missing_recipe_is_error() {
        let temp = TempDir::new().unwrap();
        let result = load_recipe(Some(Path::new("missing.toml")), temp.path());
        assert!(matches!(result, Err(ConfigError::RecipeNotFound(_))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("recipe.toml");
        fs::write(
            &path,
            r#"
            name = "x"
            version = "0.1"
            requires = ["ubitrack/1.3.0@ubitrack/stable"]
            exports_sources = ["*"]
            "#,
        )
        .unwrap();

        let result = load_recipe(Some(&path), temp.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_recipe_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("recipe.toml");
        fs::write(
            &path,
            r#"
            name = ""
            version = "0.1"
            requires = ["ubitrack/1.3.0@ubitrack/stable"]
            "#,
        )
        .unwrap();

        let result = load_recipe(Some(&path), temp.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
