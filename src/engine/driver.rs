//! engine::driver
//!
//! Build-system driver: configure, build, install.
//!
//! # Contract
//!
//! [`run_build_sequence`] invokes the three steps strictly in order. Each
//! must succeed before the next begins; the first failure halts the
//! sequence and later steps are never invoked. There are no retries.
//!
//! [`CMakeDriver`] runs the external `cmake` tool with inherited stdio, so
//! its output reaches the user unmodified.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::core::config::BuildType;
use crate::core::options::OptionModel;

/// One step of the build sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Configure,
    Build,
    Install,
}

impl BuildStep {
    /// All steps in execution order.
    pub const SEQUENCE: [BuildStep; 3] = [BuildStep::Configure, BuildStep::Build, BuildStep::Install];
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::Configure => write!(f, "configure"),
            BuildStep::Build => write!(f, "build"),
            BuildStep::Install => write!(f, "install"),
        }
    }
}

/// Errors from build steps.
#[derive(Debug, Error)]
pub enum BuildStepError {
    /// The step ran and exited non-zero.
    #[error("{step} step failed: {}", exit_description(.code))]
    Failed { step: BuildStep, code: Option<i32> },

    /// The step's program could not be started.
    #[error("{step} step could not start '{program}': {source}")]
    Spawn {
        step: BuildStep,
        program: String,
        source: std::io::Error,
    },
}

impl BuildStepError {
    /// The step that failed.
    pub fn step(&self) -> BuildStep {
        match self {
            BuildStepError::Failed { step, .. } | BuildStepError::Spawn { step, .. } => *step,
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// A build system that can configure, build and install.
pub trait BuildDriver {
    /// Generate the build system.
    fn configure(&mut self) -> Result<(), BuildStepError>;

    /// Compile.
    fn build(&mut self) -> Result<(), BuildStepError>;

    /// Install into the prefix.
    fn install(&mut self) -> Result<(), BuildStepError>;
}

/// Run configure, build and install in order, stopping at the first failure.
pub fn run_build_sequence(driver: &mut dyn BuildDriver) -> Result<(), BuildStepError> {
    for step in BuildStep::SEQUENCE {
        tracing::info!(%step, "running build step");
        match step {
            BuildStep::Configure => driver.configure()?,
            BuildStep::Build => driver.build()?,
            BuildStep::Install => driver.install()?,
        }
    }
    Ok(())
}

/// Drives an external CMake.
#[derive(Debug, Clone)]
pub struct CMakeDriver {
    /// CMake executable.
    pub program: String,
    /// Directory holding the top-level `CMakeLists.txt`.
    pub source_dir: PathBuf,
    /// Binary directory.
    pub build_dir: PathBuf,
    /// `CMAKE_INSTALL_PREFIX`.
    pub install_prefix: PathBuf,
    /// `CMAKE_BUILD_TYPE` and `--config`.
    pub build_type: BuildType,
    /// Pass `--verbose` to the build step.
    pub verbose: bool,
    /// Extra `-D` definitions, in order.
    pub definitions: Vec<(String, String)>,
}

impl CMakeDriver {
    /// Create a driver with no extra definitions.
    pub fn new(
        program: impl Into<String>,
        source_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        install_prefix: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            install_prefix: install_prefix.into(),
            build_type: BuildType::default(),
            verbose: false,
            definitions: Vec::new(),
        }
    }

    /// Forward applied overrides as `-D<DEP>_<OPTION>=<value>`.
    pub fn with_options(mut self, options: &OptionModel) -> Self {
        for (dependency, option, value) in options.iter() {
            let key = format!("{}_{}", dependency, option).to_uppercase();
            self.definitions.push((key, value.as_cmake_value()));
        }
        self
    }

    /// Arguments for a step, excluding the program.
    pub fn args(&self, step: BuildStep) -> Vec<String> {
        let build_dir = self.build_dir.display().to_string();
        match step {
            BuildStep::Configure => {
                let mut args = vec![
                    "-S".to_string(),
                    self.source_dir.display().to_string(),
                    "-B".to_string(),
                    build_dir,
                    format!("-DCMAKE_BUILD_TYPE={}", self.build_type),
                    format!("-DCMAKE_INSTALL_PREFIX={}", self.install_prefix.display()),
                ];
                args.extend(self.definitions.iter().map(|(k, v)| format!("-D{k}={v}")));
                args
            }
            BuildStep::Build => {
                let mut args = vec![
                    "--build".to_string(),
                    build_dir,
                    "--config".to_string(),
                    self.build_type.to_string(),
                ];
                if self.verbose {
                    args.push("--verbose".to_string());
                }
                args
            }
            BuildStep::Install => vec![
                "--build".to_string(),
                build_dir,
                "--config".to_string(),
                self.build_type.to_string(),
                "--target".to_string(),
                "install".to_string(),
            ],
        }
    }

    fn run(&self, step: BuildStep) -> Result<(), BuildStepError> {
        let args = self.args(step);
        tracing::debug!(%step, program = %self.program, ?args, "spawning");

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|source| BuildStepError::Spawn {
                step,
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BuildStepError::Failed {
                step,
                code: status.code(),
            });
        }
        Ok(())
    }
}

impl BuildDriver for CMakeDriver {
    fn configure(&mut self) -> Result<(), BuildStepError> {
        self.run(BuildStep::Configure)
    }

    fn build(&mut self) -> Result<(), BuildStepError> {
        self.run(BuildStep::Build)
    }

    fn install(&mut self) -> Result<(), BuildStepError> {
        self.run(BuildStep::Install)
    }
}
