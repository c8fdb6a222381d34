//! core::paths
//!
//! Centralized path routing for the staging root and the package cache.
//!
//! # Staging Layout
//!
//! Everything ubistage writes lives under the staging root:
//! - `bin/` - executables and `.dll` libraries
//! - `lib/` - `.so*`, `.dylib*` and `.a` libraries
//! - `share/Ubitrack/` - shared data files
//! - `stagebuildinfo.cmake` - CMake generator output
//! - `activate_run.sh` / `deactivate_run.sh` - environment scripts
//!
//! # Cache Layout
//!
//! A resolved package lives at `<cache>/<name>/<version>/<user>/<channel>/`.
//!
//! # Example
//!
//! ```
//! use ubistage::core::paths::{CachePaths, StagingPaths};
//! use ubistage::core::types::PackageRef;
//! use std::path::PathBuf;
//!
//! let staging = StagingPaths::new(PathBuf::from("/work"));
//! assert_eq!(staging.bin_dir(), PathBuf::from("/work/bin"));
//! assert_eq!(staging.share_dir(), PathBuf::from("/work/share/Ubitrack"));
//!
//! let cache = CachePaths::new(PathBuf::from("/cache"));
//! let reference: PackageRef = "ubitrack/1.3.0@ubitrack/stable".parse().unwrap();
//! assert_eq!(
//!     cache.package_dir(&reference),
//!     PathBuf::from("/cache/ubitrack/1.3.0/ubitrack/stable")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::PackageRef;

/// Paths inside a staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPaths {
    root: PathBuf,
}

impl StagingPaths {
    /// Create paths for the given staging root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The staging root itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staged binaries.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Staged libraries.
    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// Staged shared data.
    pub fn share_dir(&self) -> PathBuf {
        self.root.join("share").join("Ubitrack")
    }

    /// CMake generator output.
    pub fn cmake_buildinfo(&self) -> PathBuf {
        self.root.join("stagebuildinfo.cmake")
    }

    /// Environment activation script.
    pub fn activate_script(&self) -> PathBuf {
        self.root.join("activate_run.sh")
    }

    /// Environment deactivation script.
    pub fn deactivate_script(&self) -> PathBuf {
        self.root.join("deactivate_run.sh")
    }
}

/// Paths inside the local package cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    /// Create paths for the given cache root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The cache root itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Install tree of a package.
    pub fn package_dir(&self, reference: &PackageRef) -> PathBuf {
        self.root
            .join(reference.name.as_str())
            .join(reference.version.as_str())
            .join(reference.channel.user())
            .join(reference.channel.channel())
    }

    /// Manifest declaring a package's option schema.
    pub fn manifest_path(&self, reference: &PackageRef) -> PathBuf {
        self.package_dir(reference).join("package.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_generator_files_live_at_root() {
        let staging = StagingPaths::new(PathBuf::from("/s"));
        assert_eq!(staging.cmake_buildinfo(), PathBuf::from("/s/stagebuildinfo.cmake"));
        assert_eq!(staging.activate_script(), PathBuf::from("/s/activate_run.sh"));
        assert_eq!(staging.deactivate_script(), PathBuf::from("/s/deactivate_run.sh"));
        assert_eq!(staging.lib_dir(), PathBuf::from("/s/lib"));
    }

    #[test]
    fn manifest_inside_package_dir() {
        let cache = CachePaths::new(PathBuf::from("/c"));
        let r: PackageRef = "ubitrack_tools_trackman/1.0@ubitrack/stable".parse().unwrap();
        assert_eq!(
            cache.manifest_path(&r),
            PathBuf::from("/c/ubitrack_tools_trackman/1.0/ubitrack/stable/package.toml")
        );
    }
}
