//! core::rules
//!
//! Copy rules: which files of a dependency install tree are staged where.
//!
//! # Pattern Semantics
//!
//! A rule's pattern is matched against the path of each regular file
//! relative to the rule's source subtree, with `/` separators. `*` and `?`
//! may cross directory separators, so `*.*` under `share/Ubitrack` matches
//! `share/Ubitrack/data/calib.xml`. The relative path is preserved below the
//! destination subtree.
//!
//! A rule may carry an `exclude` pattern, matched the same way. Files it
//! matches are skipped even when the main pattern selects them.
//!
//! # Example
//!
//! ```
//! use ubistage::core::rules::CopyRule;
//!
//! let rule = CopyRule::new("lib", "*.so*", "lib").unwrap();
//! assert!(rule.matches("libutcore.so.1.3.0"));
//! assert!(rule.matches("ubitrack/libutvision.so"));
//! assert!(!rule.matches("libutcore.a"));
//!
//! let tools = CopyRule::new("bin", "*", "bin").unwrap().excluding("*.dll").unwrap();
//! assert!(tools.matches("trackman"));
//! assert!(!tools.matches("utcore.dll"));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from copy rule validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid subtree '{path}': {reason}")]
    InvalidSubtree { path: String, reason: String },
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A `(source-subtree, pattern, destination-subtree)` copy rule.
///
/// Subtrees are stored normalized: `/`-separated, no `.` components, no
/// leading or trailing separator. The empty string denotes the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCopyRule", into = "RawCopyRule")]
pub struct CopyRule {
    src: String,
    pattern: String,
    dst: String,
    compiled: CompiledPattern,
    exclude: Option<CompiledPattern>,
}

/// Serialized form of a copy rule, as written in recipe files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCopyRule {
    src: String,
    pattern: String,
    dst: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exclude: Option<String>,
}

impl TryFrom<RawCopyRule> for CopyRule {
    type Error = RuleError;

    fn try_from(raw: RawCopyRule) -> Result<Self, Self::Error> {
        let rule = CopyRule::new(&raw.src, &raw.pattern, &raw.dst)?;
        match raw.exclude {
            Some(exclude) => rule.excluding(&exclude),
            None => Ok(rule),
        }
    }
}

impl From<CopyRule> for RawCopyRule {
    fn from(rule: CopyRule) -> Self {
        RawCopyRule {
            src: rule.src,
            pattern: rule.pattern,
            dst: rule.dst,
            exclude: rule.exclude.map(|p| p.0.as_str().to_string()),
        }
    }
}

/// Wrapper so a compiled pattern can live in a `PartialEq` struct.
#[derive(Debug, Clone)]
struct CompiledPattern(Pattern);

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for CompiledPattern {}

impl CopyRule {
    /// Create a validated copy rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidPattern`] if the pattern does not compile,
    /// or [`RuleError::InvalidSubtree`] if either subtree is absolute or
    /// escapes its root with `..`.
    pub fn new(src: &str, pattern: &str, dst: &str) -> Result<Self, RuleError> {
        Ok(Self {
            src: normalize_subtree(src)?,
            pattern: pattern.to_string(),
            dst: normalize_subtree(dst)?,
            compiled: compile(pattern)?,
            exclude: None,
        })
    }

    /// Skip files matching `pattern`, even when the rule's pattern selects
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidPattern`] if the pattern does not compile.
    pub fn excluding(mut self, pattern: &str) -> Result<Self, RuleError> {
        self.exclude = Some(compile(pattern)?);
        Ok(self)
    }

    /// Source subtree, relative to a package install root.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// The glob pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Destination subtree, relative to the staging root.
    pub fn dst(&self) -> &str {
        &self.dst
    }

    /// The exclusion pattern, if any.
    pub fn exclude(&self) -> Option<&str> {
        self.exclude.as_ref().map(|p| p.0.as_str())
    }

    /// Check a `/`-separated path relative to the source subtree.
    pub fn matches(&self, relative: &str) -> bool {
        self.compiled.0.matches_with(relative, MATCH_OPTIONS)
            && !self
                .exclude
                .as_ref()
                .is_some_and(|p| p.0.matches_with(relative, MATCH_OPTIONS))
    }

    /// Absolute source directory inside a package install root.
    pub fn source_dir(&self, package_root: &Path) -> PathBuf {
        join_subtree(package_root, &self.src)
    }

    /// Absolute destination directory inside a staging root.
    pub fn dest_dir(&self, dest_root: &Path) -> PathBuf {
        join_subtree(dest_root, &self.dst)
    }
}

impl fmt::Display for CopyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |s: &str| if s.is_empty() { ".".to_string() } else { s.to_string() };
        write!(f, "{}/{}", show(&self.src), self.pattern)?;
        if let Some(exclude) = self.exclude() {
            write!(f, " (except {exclude})")?;
        }
        write!(f, " -> {}", show(&self.dst))
    }
}

/// The six rules every `sinkgroup_test` build stages, in declared order.
///
/// Order matters: `lib/*.dll` comes after `bin/*.dll` and targets the same
/// destination, so a library-provided DLL replaces a binary-provided one.
///
/// # Errors
///
/// Returns [`RuleError`] if a built-in rule fails validation.
pub fn default_rules() -> Result<Vec<CopyRule>, RuleError> {
    const RULES: [(&str, &str, &str); 6] = [
        ("bin", "*.dll", "bin"),
        ("lib", "*.dll", "bin"),
        ("lib", "*.dylib*", "lib"),
        ("lib", "*.so*", "lib"),
        ("lib", "*.a", "lib"),
        ("share/Ubitrack", "*.*", "share/Ubitrack"),
    ];

    RULES
        .iter()
        .map(|(src, pattern, dst)| CopyRule::new(src, pattern, dst))
        .collect()
}

fn compile(pattern: &str) -> Result<CompiledPattern, RuleError> {
    let invalid = |message: String| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        message,
    };

    if pattern.is_empty() {
        return Err(invalid("pattern cannot be empty".into()));
    }
    Pattern::new(pattern)
        .map(CompiledPattern)
        .map_err(|e| invalid(e.msg.to_string()))
}

fn normalize_subtree(path: &str) -> Result<String, RuleError> {
    let invalid = |reason: &str| RuleError::InvalidSubtree {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let unified = path.replace('\\', "/");
    if unified.starts_with('/') || unified.contains(':') {
        return Err(invalid("must be relative"));
    }

    let mut parts = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => continue,
            ".." => return Err(invalid("cannot contain '..'")),
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

fn join_subtree(root: &Path, subtree: &str) -> PathBuf {
    subtree
        .split('/')
        .filter(|c| !c.is_empty())
        .fold(root.to_path_buf(), |acc, c| acc.join(c))
}
