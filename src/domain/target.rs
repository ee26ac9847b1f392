use std::fmt;

use crate::domain::mode::Mode;
use crate::domain::version::{SemVer, UpStep};
use crate::error::Result;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Two-tier version: an opaque upstream part plus the project's own SemVer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVersion {
    pub upstream: String,
    pub local: SemVer,
}

impl ProjectVersion {
    pub fn new(upstream: impl Into<String>, local: SemVer) -> Self {
        ProjectVersion {
            upstream: upstream.into(),
            local,
        }
    }
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.upstream, self.local)
    }
}

/// What a single invocation builds and publishes.
///
/// Derived fresh from the manifest on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTarget {
    pub mode: Mode,
    pub version: ProjectVersion,
    pub docker_tag: String,
}

impl ReleaseTarget {
    /// Snapshot target: the current local version, tagged `-SNAPSHOT`
    pub fn snapshot(docker_repository: &str, upstream: &str, local: SemVer) -> Self {
        let version = ProjectVersion::new(upstream, local);
        let docker_tag = format!("{}:{}{}", docker_repository, version, SNAPSHOT_SUFFIX);
        ReleaseTarget {
            mode: Mode::Snapshot,
            version,
            docker_tag,
        }
    }

    /// Release target: the local version incremented by `step`, no suffix
    pub fn release(
        docker_repository: &str,
        upstream: &str,
        local: SemVer,
        step: UpStep,
    ) -> Result<Self> {
        let version = ProjectVersion::new(upstream, local.increment(step)?);
        let docker_tag = format!("{}:{}", docker_repository, version);
        Ok(ReleaseTarget {
            mode: Mode::Release,
            version,
            docker_tag,
        })
    }

    /// Version string, also used verbatim as the git tag name
    pub fn version_string(&self) -> String {
        self.version.to_string()
    }
}
