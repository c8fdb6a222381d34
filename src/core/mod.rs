//! core
//!
//! Core domain types, schemas, and configuration for ubistage.
//!
//! # Modules
//!
//! - [`types`] - Strong types: PackageName, PackageRef, Channel, etc.
//! - [`options`] - Typed option overrides and the option model
//! - [`rules`] - Copy rules and pattern matching
//! - [`recipe`] - The effective recipe and the built-in default
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for staging root and cache
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Schemas are strict and reject unknown fields
//! - Nothing in `core` writes to disk

pub mod config;
pub mod options;
pub mod paths;
pub mod recipe;
pub mod rules;
pub mod types;
