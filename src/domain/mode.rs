use std::fmt;
use std::str::FromStr;

use crate::error::{ReleaseError, Result};

/// Requested run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Repeatable `-SNAPSHOT` publish, no gate, tag or version change
    Snapshot,
    /// Gated publish that tags the repository and advances the local version
    Release,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Snapshot => "snapshot",
            Mode::Release => "release",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "snapshot" | "snap" | "s" => Ok(Mode::Snapshot),
            "release" | "rel" | "r" => Ok(Mode::Release),
            other => Err(ReleaseError::usage(format!(
                "unknown mode '{}' (expected snapshot|snap|s or release|rel|r)",
                other
            ))),
        }
    }
}
