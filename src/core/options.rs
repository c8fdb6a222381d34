//! core::options
//!
//! Configuration overrides forced onto dependency option schemas.
//!
//! # Overview
//!
//! A recipe may force option values onto the packages it depends on
//! (for example `ubitrack.with_default_camera = true`). Overrides are held
//! as an explicit typed list and applied to an [`OptionModel`], which the
//! resolver and the build driver consume.
//!
//! # Validation
//!
//! Two checks guard an override:
//! - The target dependency must be in scope (declared by the recipe).
//!   This is checked here, before any I/O.
//! - The option must exist on the dependency's own schema. Only the
//!   resolver knows the schema, so that check happens during resolution
//!   and is reported as [`ConfigurationError::UnknownOption`].
//!
//! # Example
//!
//! ```
//! use ubistage::core::options::{OptionModel, OptionOverride, OptionValue};
//! use ubistage::core::types::PackageName;
//!
//! let ubitrack = PackageName::new("ubitrack").unwrap();
//! let mut model = OptionModel::new([ubitrack.clone()]);
//!
//! model
//!     .apply_configuration_overrides(&[OptionOverride::new(
//!         ubitrack.clone(),
//!         "with_default_camera",
//!         OptionValue::Bool(true),
//!     )])
//!     .unwrap();
//!
//! assert_eq!(
//!     model.get(&ubitrack, "with_default_camera"),
//!     Some(&OptionValue::Bool(true))
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::PackageName;

/// Errors raised when an override does not fit its target.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The override names a dependency the recipe does not declare.
    #[error("option '{option}' targets unknown dependency '{dependency}' (declared: {declared})")]
    UnknownDependency {
        dependency: String,
        option: String,
        declared: String,
    },

    /// The option name itself is malformed.
    #[error("invalid option name '{option}' for dependency '{dependency}'")]
    InvalidOptionName { dependency: String, option: String },

    /// The dependency's schema has no such option.
    #[error("dependency '{dependency}' has no option '{option}'")]
    UnknownOption { dependency: String, option: String },

    /// The dependency's schema rejects the value.
    #[error("invalid value '{value}' for option '{dependency}:{option}', expected {expected}")]
    InvalidValue {
        dependency: String,
        option: String,
        value: String,
        expected: String,
    },
}

/// A typed option value.
///
/// Deserializes from a bare TOML/JSON boolean or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean switch (e.g. `with_default_camera`).
    Bool(bool),
    /// String value, usually one of an enumerated set.
    Str(String),
}

impl OptionValue {
    /// Value as passed to CMake: booleans become `ON`/`OFF`.
    pub fn as_cmake_value(&self) -> String {
        match self {
            OptionValue::Bool(true) => "ON".to_string(),
            OptionValue::Bool(false) => "OFF".to_string(),
            OptionValue::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

/// One `(dependency, option, value)` override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionOverride {
    /// Dependency whose option is forced.
    pub dependency: PackageName,
    /// Option name on the dependency's schema.
    pub option: String,
    /// Forced value.
    pub value: OptionValue,
}

impl OptionOverride {
    /// Create a new override.
    pub fn new(
        dependency: PackageName,
        option: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Self {
        Self {
            dependency,
            option: option.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for OptionOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.dependency, self.option, self.value)
    }
}

/// In-memory option configuration for the dependencies in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionModel {
    scope: BTreeSet<PackageName>,
    values: BTreeMap<PackageName, BTreeMap<String, OptionValue>>,
}

impl OptionModel {
    /// Create an empty model over the given dependency scope.
    pub fn new(scope: impl IntoIterator<Item = PackageName>) -> Self {
        Self {
            scope: scope.into_iter().collect(),
            values: BTreeMap::new(),
        }
    }

    /// Apply overrides to the model.
    ///
    /// The whole list is validated first; on error the model is left
    /// unchanged. A later override of the same option replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownDependency`] if an override
    /// targets a dependency outside the scope, or
    /// [`ConfigurationError::InvalidOptionName`] for a malformed option name.
    pub fn apply_configuration_overrides(
        &mut self,
        overrides: &[OptionOverride],
    ) -> Result<(), ConfigurationError> {
        for o in overrides {
            if !self.scope.contains(&o.dependency) {
                return Err(ConfigurationError::UnknownDependency {
                    dependency: o.dependency.to_string(),
                    option: o.option.clone(),
                    declared: self.declared_list(),
                });
            }
            if !is_valid_option_name(&o.option) {
                return Err(ConfigurationError::InvalidOptionName {
                    dependency: o.dependency.to_string(),
                    option: o.option.clone(),
                });
            }
        }

        for o in overrides {
            tracing::debug!(dependency = %o.dependency, option = %o.option, value = %o.value, "applying override");
            self.values
                .entry(o.dependency.clone())
                .or_default()
                .insert(o.option.clone(), o.value.clone());
        }
        Ok(())
    }

    /// Get the forced value of an option, if any.
    pub fn get(&self, dependency: &PackageName, option: &str) -> Option<&OptionValue> {
        self.values.get(dependency).and_then(|opts| opts.get(option))
    }

    /// All forced options of one dependency.
    pub fn options_for(&self, dependency: &PackageName) -> Option<&BTreeMap<String, OptionValue>> {
        self.values.get(dependency)
    }

    /// Whether a dependency is in scope.
    pub fn in_scope(&self, dependency: &PackageName) -> bool {
        self.scope.contains(dependency)
    }

    /// Iterate over every applied override in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &str, &OptionValue)> {
        self.values.iter().flat_map(|(dep, opts)| {
            opts.iter()
                .map(move |(name, value)| (dep, name.as_str(), value))
        })
    }

    /// Check if no override has been applied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn declared_list(&self) -> String {
        self.scope
            .iter()
            .map(PackageName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Option names are identifiers: ASCII alphanumerics and `_`, not empty.
fn is_valid_option_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
