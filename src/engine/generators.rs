//! engine::generators
//!
//! Helper files written into the staging root after staging.
//!
//! - `cmake` writes `stagebuildinfo.cmake`, which a consuming
//!   `CMakeLists.txt` can `include()` to find the resolved dependencies and
//!   the staged subtrees.
//! - `virtualenv` writes `activate_run.sh` / `deactivate_run.sh`, which put
//!   the staged `bin` and `lib` directories on the search paths of a shell.
//!
//! Rendering is pure; only [`run_generators`] touches the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::resolve::PackageInstall;
use crate::core::config::GeneratorKind;
use crate::core::paths::StagingPaths;

/// Errors from generators.
#[derive(Debug, Error)]
#[error("{generator} generator failed to write '{path}': {source}")]
pub struct GeneratorError {
    pub generator: GeneratorKind,
    pub path: PathBuf,
    pub source: std::io::Error,
}

const HEADER: &str = "# Generated by ubistage. Do not edit.";

/// Render `stagebuildinfo.cmake`.
pub fn render_cmake(installs: &[PackageInstall], staging: &StagingPaths) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    let names: Vec<&str> = installs.iter().map(|i| i.name().as_str()).collect();
    out.push_str(&format!("set(STAGE_DEPENDENCIES {})\n", names.join(" ")));

    for install in installs {
        let root = cmake_path(&install.root);
        out.push_str(&format!(
            "set(STAGE_{}_ROOT \"{}\")\n",
            install.name().as_str().to_uppercase(),
            root
        ));
        out.push_str(&format!("list(APPEND CMAKE_PREFIX_PATH \"{}\")\n", root));
    }

    out.push_str(&format!("set(STAGE_BIN_DIR \"{}\")\n", cmake_path(&staging.bin_dir())));
    out.push_str(&format!("set(STAGE_LIB_DIR \"{}\")\n", cmake_path(&staging.lib_dir())));
    out.push_str(&format!(
        "set(STAGE_SHARE_DIR \"{}\")\n",
        cmake_path(&staging.share_dir())
    ));
    out
}

/// Render `activate_run.sh`.
pub fn render_activate(staging: &StagingPaths) -> String {
    let bin = shell_path(&staging.bin_dir());
    let lib = shell_path(&staging.lib_dir());

    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str("# Usage: . ./activate_run.sh\n");
    out.push_str("export UBISTAGE_OLD_PATH=\"$PATH\"\n");
    for var in ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"] {
        out.push_str(&format!("export UBISTAGE_OLD_{var}=\"${{{var}:-}}\"\n"));
    }
    out.push_str(&format!("export PATH={bin}\":$PATH\"\n"));
    for var in ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"] {
        out.push_str(&format!("export {var}={lib}\"${{{var}:+:${var}}}\"\n"));
    }
    out
}

/// Render `deactivate_run.sh`.
pub fn render_deactivate() -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str("# Usage: . ./deactivate_run.sh\n");
    for var in ["PATH", "LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"] {
        out.push_str(&format!("export {var}=\"$UBISTAGE_OLD_{var}\"\n"));
        out.push_str(&format!("unset UBISTAGE_OLD_{var}\n"));
    }
    out
}

/// Run the requested generators, returning the files written.
pub fn run_generators(
    kinds: &[GeneratorKind],
    installs: &[PackageInstall],
    staging: &StagingPaths,
) -> Result<Vec<PathBuf>, GeneratorError> {
    let mut written = Vec::new();

    for &kind in kinds {
        let files = match kind {
            GeneratorKind::Cmake => vec![(staging.cmake_buildinfo(), render_cmake(installs, staging))],
            GeneratorKind::Virtualenv => vec![
                (staging.activate_script(), render_activate(staging)),
                (staging.deactivate_script(), render_deactivate()),
            ],
        };

        for (path, contents) in files {
            write_file(&path, &contents).map_err(|source| GeneratorError {
                generator: kind,
                path: path.clone(),
                source,
            })?;
            tracing::debug!(generator = %kind, path = %path.display(), "generated");
            written.push(path);
        }
    }

    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// CMake wants forward slashes on every platform.
fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Single-quoted, so the shell expands nothing inside the path.
fn shell_path(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}
