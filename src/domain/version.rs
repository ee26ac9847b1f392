use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{ReleaseError, Result};

const SEMVER_PATTERN: &str = r"^([0-9]+)\.([0-9]+)\.([0-9]+)$";

/// Project-local semantic version (`major.minor.revision`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub revision: u64,
}

impl SemVer {
    /// Create a new version
    pub fn new(major: u64, minor: u64, revision: u64) -> Self {
        SemVer {
            major,
            minor,
            revision,
        }
    }

    /// Parse a strict `X.Y.Z` string.
    ///
    /// No prefix, suffix, whitespace or pre-release part is tolerated.
    pub fn parse(text: &str) -> Result<Self> {
        let re = Regex::new(SEMVER_PATTERN).map_err(|e| ReleaseError::format(e.to_string()))?;

        let caps = re.captures(text).ok_or_else(|| {
            ReleaseError::format(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                text
            ))
        })?;

        let component = |index: usize, name: &str| -> Result<u64> {
            caps[index].parse::<u64>().map_err(|_| {
                ReleaseError::format(format!(
                    "Invalid {} version in '{}': out of range",
                    name, text
                ))
            })
        };

        Ok(SemVer {
            major: component(1, "major")?,
            minor: component(2, "minor")?,
            revision: component(3, "revision")?,
        })
    }

    /// Increment one component, resetting the lower ones
    ///
    /// # Returns
    /// * `Err(Format)` - The incremented component would exceed `u64::MAX`
    pub fn increment(&self, step: UpStep) -> Result<Self> {
        let bump = |value: u64| {
            value.checked_add(1).ok_or_else(|| {
                ReleaseError::format(format!(
                    "cannot increment {} of {}: component overflows",
                    step, self
                ))
            })
        };

        Ok(match step {
            UpStep::Major => SemVer::new(bump(self.major)?, 0, 0),
            UpStep::Minor => SemVer::new(self.major, bump(self.minor)?, 0),
            UpStep::Revision => SemVer::new(self.major, self.minor, bump(self.revision)?),
        })
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

impl FromStr for SemVer {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        SemVer::parse(s)
    }
}

/// Which component of the local version a release increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpStep {
    Major,
    #[default]
    Minor,
    Revision,
}

impl UpStep {
    pub fn name(&self) -> &'static str {
        match self {
            UpStep::Major => "major",
            UpStep::Minor => "minor",
            UpStep::Revision => "revision",
        }
    }
}

impl fmt::Display for UpStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpStep {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(UpStep::Major),
            "minor" => Ok(UpStep::Minor),
            "revision" => Ok(UpStep::Revision),
            other => Err(ReleaseError::invalid_argument(format!(
                "unknown up-step '{}' (expected major, minor or revision)",
                other
            ))),
        }
    }
}
