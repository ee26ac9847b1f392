use std::cell::RefCell;
use std::path::Path;

use crate::error::{ReleaseError, Result, Step};
use crate::tools::{BuildInput, Toolchain};

/// Records tool invocations instead of running them
#[derive(Default)]
pub struct MockToolchain {
    fail_at: Option<Step>,
    calls: RefCell<Vec<String>>,
    inputs: RefCell<Vec<BuildInput>>,
}

impl MockToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given step return a failure
    pub fn failing_at(step: Step) -> Self {
        MockToolchain {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    /// Invocations in order, e.g. `build:make`, `image:Dockerfile:<tag>`, `push:<tag>`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn build_inputs(&self) -> Vec<BuildInput> {
        self.inputs.borrow().clone()
    }

    fn record(&self, step: Step, call: String) -> Result<()> {
        self.calls.borrow_mut().push(call);
        if self.fail_at == Some(step) {
            return Err(ReleaseError::step(step, "exited with code 1"));
        }
        Ok(())
    }
}

impl Toolchain for MockToolchain {
    fn build_artifact(&self, command: &str, input: &BuildInput) -> Result<()> {
        self.inputs.borrow_mut().push(input.clone());
        self.record(Step::Build, format!("build:{}", command))
    }

    fn build_image(&self, dockerfile: &Path, tag: &str) -> Result<()> {
        self.record(
            Step::ImageBuild,
            format!("image:{}:{}", dockerfile.display(), tag),
        )
    }

    fn push_image(&self, tag: &str) -> Result<()> {
        self.record(Step::ImagePush, format!("push:{}", tag))
    }
}
