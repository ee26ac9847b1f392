use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, info, instrument};

use crate::error::{ReleaseError, Result, Step};
use crate::tools::{BuildInput, Toolchain};

/// Runs the build command through `sh -c` and the container tool as a
/// child process, all inside the project directory.
///
/// Output is inherited so the operator sees build and push logs live.
pub struct ProcessToolchain {
    workdir: PathBuf,
    docker: String,
}

impl ProcessToolchain {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        ProcessToolchain {
            workdir: workdir.into(),
            docker: "docker".to_string(),
        }
    }

    /// Use a different container CLI (e.g. `podman`)
    pub fn with_container_tool(mut self, program: impl Into<String>) -> Self {
        self.docker = program.into();
        self
    }

    fn run(&self, step: Step, mut cmd: Command) -> Result<()> {
        let start = std::time::Instant::now();
        cmd.current_dir(&self.workdir);
        debug!(?cmd, "spawning");

        let status = cmd.status().map_err(|e| {
            ReleaseError::step(
                step,
                format!("could not start {:?}: {}", cmd.get_program(), e),
            )
        })?;

        info!(
            %step,
            success = status.success(),
            duration_ms = start.elapsed().as_millis(),
            "external step finished"
        );
        check_status(step, status)
    }
}

fn check_status(step: Step, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    let detail = match status.code() {
        Some(code) => format!("exited with code {}", code),
        None => "terminated by a signal".to_string(),
    };
    Err(ReleaseError::step(step, detail))
}

impl Toolchain for ProcessToolchain {
    #[instrument(skip(self, input), fields(version = %input.version))]
    fn build_artifact(&self, command: &str, input: &BuildInput) -> Result<()> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).envs(input.to_env_vars());
        self.run(Step::Build, cmd)
    }

    #[instrument(skip(self, dockerfile), fields(dockerfile = %dockerfile.display()))]
    fn build_image(&self, dockerfile: &Path, tag: &str) -> Result<()> {
        let mut cmd = Command::new(&self.docker);
        cmd.arg("build")
            .arg("-f")
            .arg(dockerfile)
            .arg("-t")
            .arg(tag)
            .arg(".");
        self.run(Step::ImageBuild, cmd)
    }

    #[instrument(skip(self))]
    fn push_image(&self, tag: &str) -> Result<()> {
        let mut cmd = Command::new(&self.docker);
        cmd.arg("push").arg(tag);
        self.run(Step::ImagePush, cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input() -> BuildInput {
        BuildInput {
            version: "3.0.0-1.4.2".to_string(),
            docker_tag: "reg/app:3.0.0-1.4.2-SNAPSHOT".to_string(),
        }
    }

    #[test]
    fn test_build_command_receives_inputs() {
        let temp = TempDir::new().unwrap();
        let tools = ProcessToolchain::new(temp.path());

        tools
            .build_artifact("printf '%s %s' \"$VERSION\" \"$DOCKER_TAG\" > out.txt", &input())
            .unwrap();

        let written = std::fs::read_to_string(temp.path().join("out.txt")).unwrap();
        assert_eq!(written, "3.0.0-1.4.2 reg/app:3.0.0-1.4.2-SNAPSHOT");
    }

    #[test]
    fn test_build_inputs_do_not_leak_into_own_environment() {
        let temp = TempDir::new().unwrap();
        let tools = ProcessToolchain::new(temp.path());
        tools.build_artifact("true", &input()).unwrap();
        assert!(std::env::var("DOCKER_TAG").is_err());
    }

    #[test]
    fn test_failing_build_command_is_step_failure() {
        let temp = TempDir::new().unwrap();
        let tools = ProcessToolchain::new(temp.path());

        let err = tools.build_artifact("exit 3", &input()).unwrap_err();
        match err {
            ReleaseError::Step { step, message } => {
                assert_eq!(step, Step::Build);
                assert!(message.contains("code 3"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_container_tool_is_step_failure() {
        let temp = TempDir::new().unwrap();
        let tools = ProcessToolchain::new(temp.path())
            .with_container_tool("dock-release-no-such-container-tool");

        let err = tools.push_image("reg/app:1").unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Step {
                step: Step::ImagePush,
                ..
            }
        ));
    }
}
