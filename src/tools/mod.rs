//! External build and container tools
//!
//! The orchestrator drives three opaque operations: the project's build
//! command, a container image build and a container push. They sit behind
//! the [Toolchain] trait so a release can be exercised without docker.

pub mod mock;
pub mod process;

pub use mock::MockToolchain;
pub use process::ProcessToolchain;

use std::collections::HashMap;
use std::path::Path;

use crate::domain::ReleaseTarget;
use crate::error::Result;

/// Inputs handed to the build command
///
/// Passed explicitly to the child process; the tool never writes them into
/// its own environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInput {
    /// Computed version, e.g. `3.0.0-1.5.0`
    pub version: String,
    /// Full image reference, e.g. `registry/app:3.0.0-1.5.0`
    pub docker_tag: String,
}

impl BuildInput {
    pub fn for_target(target: &ReleaseTarget) -> Self {
        BuildInput {
            version: target.version_string(),
            docker_tag: target.docker_tag.clone(),
        }
    }

    /// Environment variables exposed to the build command
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("VERSION".to_string(), self.version.clone());
        env.insert("DOCKER_TAG".to_string(), self.docker_tag.clone());
        env
    }
}

/// Blocking external operations used by snapshot and release runs
pub trait Toolchain {
    /// Run the project's build command
    fn build_artifact(&self, command: &str, input: &BuildInput) -> Result<()>;

    /// Build a container image from `dockerfile`, tagged `tag`
    fn build_image(&self, dockerfile: &Path, tag: &str) -> Result<()>;

    /// Push `tag` to its registry
    fn push_image(&self, tag: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReleaseTarget, SemVer, UpStep};

    #[test]
    fn test_build_input_env_vars() {
        let target = ReleaseTarget::release("reg/app", "3.0.0", SemVer::new(1, 4, 2), UpStep::Minor)
            .unwrap();
        let env = BuildInput::for_target(&target).to_env_vars();

        assert_eq!(env.len(), 2);
        assert_eq!(env.get("VERSION"), Some(&"3.0.0-1.5.0".to_string()));
        assert_eq!(
            env.get("DOCKER_TAG"),
            Some(&"reg/app:3.0.0-1.5.0".to_string())
        );
    }
}
