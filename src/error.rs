//! Error types for plan loading and step execution

use std::path::PathBuf;
use thiserror::Error;

use crate::step::PackageManager;

/// Errors from invoking a step's underlying system action
#[derive(Error, Debug)]
pub enum StepError {
    /// apt/pip/npm invocation failed
    #[error("{manager} failed for {package}: {stderr}")]
    PackageManager {
        manager: PackageManager,
        package: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Arbitrary shell command returned non-zero
    #[error("command `{command}` failed: {stderr}")]
    CommandExecution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// git clone failed (network, auth, or existing-directory conflict)
    #[error("git clone of {url} failed: {stderr}")]
    Clone {
        url: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The process could not be started or a directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StepError {
    /// Exit code of the failed process, if it ran at all
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::PackageManager { exit_code, .. }
            | Self::CommandExecution { exit_code, .. }
            | Self::Clone { exit_code, .. } => *exit_code,
            Self::Io(_) => None,
        }
    }

    /// Captured stderr of the failed process
    pub fn stderr(&self) -> &str {
        match self {
            Self::PackageManager { stderr, .. }
            | Self::CommandExecution { stderr, .. }
            | Self::Clone { stderr, .. } => stderr,
            Self::Io(_) => "",
        }
    }
}

/// Errors from loading or validating a plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// Plan file could not be read
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plan file is not valid TOML
    #[error("invalid TOML plan: {0}")]
    Toml(#[from] toml::de::Error),

    /// Plan file is not valid JSON
    #[error("invalid JSON plan: {0}")]
    Json(#[from] serde_json::Error),

    /// Extension is neither .toml nor .json
    #[error("unsupported plan format: {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A plan must declare at least one step
    #[error("plan has no steps")]
    Empty,

    /// Every step needs a target to act on
    #[error("step `{0}` has an empty target")]
    EmptyTarget(String),

    /// Step names key the final report, so they must be unique
    #[error("duplicate step name `{0}`")]
    DuplicateName(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::PackageManager;

    #[test]
    fn step_error_exposes_exit_code_and_stderr() {
        let err = StepError::PackageManager {
            manager: PackageManager::Apt,
            package: "jq".to_string(),
            exit_code: Some(100),
            stderr: "E: Unable to locate package".to_string(),
        };
        assert_eq!(err.exit_code(), Some(100));
        assert_eq!(err.stderr(), "E: Unable to locate package");
        assert!(err.to_string().contains("apt failed for jq"));
    }

    #[test]
    fn io_error_has_no_exit_code() {
        let err = StepError::Io(std::io::Error::other("boom"));
        assert_eq!(err.exit_code(), None);
        assert_eq!(err.stderr(), "");
    }
}
