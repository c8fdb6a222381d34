//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PackageName`] - Validated package name
//! - [`Version`] - Validated package version string
//! - [`Channel`] - `user/channel` pair a package is published under
//! - [`PackageRef`] - Full `name/version@user/channel` reference
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`RunId`] - Identifier for a single pipeline run
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use ubistage::core::types::{PackageName, PackageRef};
//!
//! let reference: PackageRef = "ubitrack/1.3.0@ubitrack/stable".parse().unwrap();
//! assert_eq!(reference.name.as_str(), "ubitrack");
//! assert_eq!(reference.version.as_str(), "1.3.0");
//! assert_eq!(reference.channel.to_string(), "ubitrack/stable");
//!
//! assert!(PackageName::new("has space").is_err());
//! assert!("ubitrack@ubitrack/stable".parse::<PackageRef>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    #[error("invalid package reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },
}

/// Check one component of a reference.
///
/// Returns a human-readable reason on failure.
fn check_component(value: &str, what: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{what} cannot be empty"));
    }
    if value.starts_with('.') || value.starts_with('-') {
        return Err(format!("{what} cannot start with '.' or '-'"));
    }
    for c in value.chars() {
        if c.is_whitespace() || c.is_control() {
            return Err(format!("{what} cannot contain whitespace"));
        }
        if matches!(c, '/' | '\\' | '@' | ':' | '*' | '?') {
            return Err(format!("{what} cannot contain '{c}'"));
        }
    }
    Ok(())
}

/// A validated package name.
///
/// # Example
///
/// ```
/// use ubistage::core::types::PackageName;
///
/// let name = PackageName::new("ubitrack_tools_trackman").unwrap();
/// assert_eq!(name.as_str(), "ubitrack_tools_trackman");
///
/// assert!(PackageName::new("").is_err());
/// assert!(PackageName::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new validated package name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPackageName` if the name is empty or
    /// contains separators or whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_component(&name, "package name").map_err(TypeError::InvalidPackageName)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated version string.
///
/// Versions are opaque: the only requirement is that they name a published
/// artifact, which the resolver checks. Locally we only reject strings that
/// could not be a path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Create a new validated version.
    pub fn new(version: impl Into<String>) -> Result<Self, TypeError> {
        let version = version.into();
        check_component(&version, "version").map_err(TypeError::InvalidVersion)?;
        Ok(Self(version))
    }

    /// Get the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Version {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `user/channel` pair a package is published under.
///
/// # Example
///
/// ```
/// use ubistage::core::types::Channel;
///
/// let channel: Channel = "ubitrack/stable".parse().unwrap();
/// assert_eq!(channel.user(), "ubitrack");
/// assert_eq!(channel.channel(), "stable");
/// assert!("stable".parse::<Channel>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Channel {
    user: String,
    channel: String,
}

impl Channel {
    /// Create a channel from its two components.
    pub fn new(user: impl Into<String>, channel: impl Into<String>) -> Result<Self, TypeError> {
        let user = user.into();
        let channel = channel.into();
        check_component(&user, "channel user").map_err(TypeError::InvalidChannel)?;
        check_component(&channel, "channel name").map_err(TypeError::InvalidChannel)?;
        Ok(Self { user, channel })
    }

    /// The publishing user.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The channel name (e.g. `stable`).
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl FromStr for Channel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((user, channel)) => Self::new(user, channel),
            None => Err(TypeError::InvalidChannel(format!(
                "'{s}' is not of the form user/channel"
            ))),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.channel)
    }
}

/// A full dependency reference: `name/version@user/channel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageRef {
    /// Package name.
    pub name: PackageName,
    /// Published version.
    pub version: Version,
    /// Publishing channel.
    pub channel: Channel,
}

impl PackageRef {
    /// Create a reference from already-validated parts.
    pub fn new(name: PackageName, version: Version, channel: Channel) -> Self {
        Self {
            name,
            version,
            channel,
        }
    }
}

impl FromStr for PackageRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| TypeError::InvalidReference {
            reference: s.to_string(),
            reason,
        };

        let (package, channel) = s
            .split_once('@')
            .ok_or_else(|| invalid("missing '@user/channel'".into()))?;
        let (name, version) = package
            .split_once('/')
            .ok_or_else(|| invalid("missing '/version'".into()))?;

        let name = PackageName::new(name).map_err(|e| invalid(e.to_string()))?;
        let version = Version::new(version).map_err(|e| invalid(e.to_string()))?;
        let channel: Channel = channel.parse().map_err(|e: TypeError| invalid(e.to_string()))?;

        Ok(Self::new(name, version, channel))
    }
}

impl TryFrom<String> for PackageRef {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PackageRef> for String {
    fn from(reference: PackageRef) -> Self {
        reference.to_string()
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.name, self.version, self.channel)
    }
}

/// An RFC3339 timestamp in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Unique identifier for a pipeline run, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Generate a new unique run id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
