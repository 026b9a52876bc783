//! # mb - multi-target build orchestrator
//!
//! `mb` builds a suite of small Go tools that share one source directory.
//! Each tool is declared by a JSON file listing its flags; `mb` decides which
//! tools are enabled for the target platform, generates an entrypoint per
//! tool embedding its configuration, rebuilds only stale tools, compiles them
//! in parallel in isolated workspaces, and writes an install manifest.
//!
//! ## Module Organization
//!
//! - [`config`] - Run settings (`mb.toml` and environment)
//! - [`targets`] - Declaration scanning and enablement
//! - [`sources`] - Shared and per-target source files
//! - [`build`] - Staleness, entrypoint generation and parallel compilation
//! - [`manifest`] - Install manifest (`Makefile`)

/// Parallel build engine.
pub mod build;

/// Run settings.
pub mod config;

/// Error taxonomy.
pub mod error;

/// Install manifest generation.
pub mod manifest;

/// Source directory partitioning.
pub mod sources;

/// Target declarations.
pub mod targets;

/// Terminal output helpers.
pub mod ui;

pub use error::{BuildError, Result};
