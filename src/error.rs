//! Error taxonomy for a build run.
//!
//! Scan and staleness errors abort the run as soon as they happen. Build
//! errors are owned by a single target and collected by the coordinator,
//! which joins them into [`BuildError::BuildFailed`] once every task has
//! reported.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// Malformed or incomplete declaration file.
    #[error("invalid declaration {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("no build targets enabled for platform '{platform}' (checked {scanned} declaration(s))")]
    NoTargets { platform: String, scanned: usize },

    /// Unreadable source directory or an enabled target without entry file.
    #[error("{0}")]
    Source(String),

    #[error("unable to stat {}: {source}", .path.display())]
    Staleness {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workspace setup, file copy or toolchain failure for one target.
    #[error("[{target}] {message}")]
    Build { target: String, message: String },

    #[error("unable to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every per-target failure of a run, in dispatch order.
    #[error("{} target(s) failed:\n{}", .0.len(), join_lines(.0))]
    BuildFailed(Vec<BuildError>),
}

impl BuildError {
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BuildError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn build(target: impl Into<String>, message: impl Into<String>) -> Self {
        BuildError::Build {
            target: target.into(),
            message: message.into(),
        }
    }
}

fn join_lines(errors: &[BuildError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_lists_every_target() {
        let err = BuildError::BuildFailed(vec![
            BuildError::build("alpha", "go build exited with status 1"),
            BuildError::build("beta", "unable to copy shared.go"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 target(s) failed"));
        assert!(msg.contains("[alpha] go build exited with status 1"));
        assert!(msg.contains("[beta] unable to copy shared.go"));
    }

    #[test]
    fn test_config_error_names_file() {
        let err = BuildError::config("/tmp/decl/alpha.json", "no Flags field");
        assert_eq!(
            err.to_string(),
            "invalid declaration /tmp/decl/alpha.json: no Flags field"
        );
    }
}
