//! ubistage - stage Ubitrack dependency artifacts and drive the CMake build
//!
//! ubistage runs a build recipe for a component that depends on prebuilt
//! Ubitrack packages. It forces dependency options, resolves each package
//! in a local cache, copies the runtime artifacts (DLLs, shared and static
//! libraries, `share/Ubitrack` data) into a staging root, writes helper
//! files, and then configures, builds and installs the component with CMake.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Overrides → Resolve → Plan → Stage → Generate → Build
//! - [`core`] - Domain types, options, copy rules, recipe and config schemas
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Option overrides are validated before any dependency is resolved
//! 2. Copy rules apply in declared order; a later rule's copy wins
//! 3. Staging never deletes a file it did not write
//! 4. Build steps run configure, build, install, halting at the first failure

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
