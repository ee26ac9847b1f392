use std::fmt;

use thiserror::Error;

use crate::gate::Denial;

/// Unified error type for dock-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version format error: {0}")]
    Format(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Release blocked: {0}")]
    GateDenied(Denial),

    #[error("Aborted by operator: {0}")]
    Aborted(String),

    #[error("{step} failed: {message}")]
    Step { step: Step, message: String },

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in dock-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// The externally visible steps of a snapshot or release run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Build,
    ImageBuild,
    ImagePush,
    Tag,
    VersionBump,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Build => "Build",
            Step::ImageBuild => "Container build",
            Step::ImagePush => "Container push",
            Step::Tag => "Tagging",
            Step::VersionBump => "Version bump",
        };
        f.write_str(name)
    }
}

impl ReleaseError {
    /// Create a usage error with context
    pub fn usage(msg: impl Into<String>) -> Self {
        ReleaseError::Usage(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version format error with context
    pub fn format(msg: impl Into<String>) -> Self {
        ReleaseError::Format(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidArgument(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    pub fn aborted(msg: impl Into<String>) -> Self {
        ReleaseError::Aborted(msg.into())
    }

    /// Create a step failure for the given step
    pub fn step(step: Step, msg: impl Into<String>) -> Self {
        ReleaseError::Step {
            step,
            message: msg.into(),
        }
    }

    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::Usage(_) | ReleaseError::InvalidArgument(_) => 2,
            ReleaseError::Config(_) | ReleaseError::Format(_) => 3,
            ReleaseError::GateDenied(_) => 4,
            ReleaseError::Step { .. } => 5,
            ReleaseError::Aborted(_) => 130,
            ReleaseError::Remote(_) | ReleaseError::Git(_) | ReleaseError::Io(_) => 1,
        }
    }
}
