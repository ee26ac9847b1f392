//! Snapshot and release workflows
//!
//! Holds the sequencing logic kept out of main.rs: request validation, target
//! computation and the ordered build → publish → tag → bump steps. Every step
//! blocks until its external operation finishes and the first failure ends
//! the run.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::{Mode, ReleaseTarget, SemVer, UpStep};
use crate::error::{ReleaseError, Result, Step};
use crate::gate::{GateDecision, RepositoryGate};
use crate::git::Repository;
use crate::manifest::Manifest;
use crate::tools::{BuildInput, Toolchain};
use crate::ui::{self, Confirm, Confirmation};

/// Arguments for a run, as given on the command line
///
/// Decoupled from clap so the workflow can be validated and driven
/// programmatically.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseRequest {
    /// Mode text, e.g. `snap` or `release`
    pub mode: String,

    /// Build without pushing (snapshot only)
    pub build_only: bool,

    /// Push an already built image (snapshot only)
    pub push_only: bool,

    /// Up-step override (release only)
    pub up_step: Option<String>,
}

/// A validated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Snapshot { build: bool, push: bool },
    Release { up_step: UpStep },
}

impl ReleaseRequest {
    /// Validate the request before any work begins.
    ///
    /// # Returns
    /// * `Err(Usage)` - Unknown mode, both modifiers, or a modifier in
    ///   release mode
    /// * `Err(InvalidArgument)` - Unknown up-step in release mode
    pub fn plan(&self) -> Result<Plan> {
        let mode: Mode = self.mode.parse()?;

        if self.build_only && self.push_only {
            return Err(ReleaseError::usage(
                "--build-only and --push-only are mutually exclusive",
            ));
        }

        match mode {
            Mode::Snapshot => {
                if let Some(step) = &self.up_step {
                    warn!(up_step = %step, "up-step is ignored in snapshot mode");
                }
                Ok(Plan::Snapshot {
                    build: !self.push_only,
                    push: !self.build_only,
                })
            }
            Mode::Release => {
                if self.build_only || self.push_only {
                    return Err(ReleaseError::usage(
                        "--build-only and --push-only are only valid in snapshot mode",
                    ));
                }
                let up_step = match &self.up_step {
                    Some(text) => text.parse()?,
                    None => UpStep::default(),
                };
                Ok(Plan::Release { up_step })
            }
        }
    }
}

impl Plan {
    /// Version and image tag this plan produces for `manifest`
    ///
    /// Fails with a format error when the up-step would overflow the local
    /// version.
    pub fn target(&self, manifest: &Manifest) -> Result<ReleaseTarget> {
        match self {
            Plan::Snapshot { .. } => Ok(ReleaseTarget::snapshot(
                &manifest.docker_repository,
                &manifest.upstream_version,
                manifest.local_version,
            )),
            Plan::Release { up_step } => ReleaseTarget::release(
                &manifest.docker_repository,
                &manifest.upstream_version,
                manifest.local_version,
                *up_step,
            ),
        }
    }

    /// Local version persisted after a successful run, if any
    pub fn next_local_version(&self, manifest: &Manifest) -> Result<Option<SemVer>> {
        match self {
            Plan::Snapshot { .. } => Ok(None),
            Plan::Release { .. } => Ok(Some(manifest.with_bumped_local_version()?.local_version)),
        }
    }

    /// Human readable list of the steps a run would execute
    pub fn steps(&self, manifest: &Manifest) -> Result<Vec<String>> {
        let target = self.target(manifest)?;
        let mut steps = Vec::new();

        if let Plan::Release { .. } = self {
            steps.push(format!(
                "check repository gate against {}/{}",
                manifest.remote, manifest.main_branch
            ));
            steps.push("ask for confirmation".to_string());
        }

        let build = matches!(
            self,
            Plan::Release { .. } | Plan::Snapshot { build: true, .. }
        );
        let push = matches!(self, Plan::Release { .. } | Plan::Snapshot { push: true, .. });

        if build {
            steps.push(format!("run `{}`", manifest.build_command));
            steps.push(format!(
                "build image {} from {}",
                target.docker_tag, manifest.dockerfile
            ));
        }
        if push {
            steps.push(format!("push image {}", target.docker_tag));
        }

        if let Some(next) = self.next_local_version(manifest)? {
            steps.push(format!(
                "create and push tag {} to {}",
                target.version, manifest.remote
            ));
            steps.push(format!(
                "bump local version to {} and push {}",
                next, manifest.main_branch
            ));
        }
        Ok(steps)
    }
}

/// Result of a successful workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub target: ReleaseTarget,

    /// Whether the artifact and image were built
    pub built: bool,

    /// Whether the image was pushed
    pub pushed: bool,

    /// Whether a git tag was created and pushed
    pub tagged: bool,

    /// Local version written back to the manifest
    pub next_local_version: Option<SemVer>,
}

/// Drives snapshot and release runs for one manifest.
pub struct ReleaseOrchestrator<'a, T: Toolchain, P: Confirm> {
    manifest: &'a Manifest,
    manifest_path: &'a Path,
    tools: &'a T,
    prompt: &'a P,
}

impl<'a, T: Toolchain, P: Confirm> ReleaseOrchestrator<'a, T, P> {
    pub fn new(manifest: &'a Manifest, manifest_path: &'a Path, tools: &'a T, prompt: &'a P) -> Self {
        ReleaseOrchestrator {
            manifest,
            manifest_path,
            tools,
            prompt,
        }
    }

    /// Snapshot run: build and/or push a `-SNAPSHOT` image.
    ///
    /// Never consults the repository, never prompts, never tags and never
    /// touches the manifest.
    pub fn snapshot(&self, build: bool, push: bool) -> Result<WorkflowResult> {
        let plan = Plan::Snapshot { build, push };
        let target = plan.target(self.manifest)?;
        ui::display_target(&target, None);

        if build {
            self.build(&target)?;
        }
        if push {
            self.push(&target)?;
        }

        info!(tag = %target.docker_tag, built = build, pushed = push, "snapshot finished");
        Ok(WorkflowResult {
            target,
            built: build,
            pushed: push,
            tagged: false,
            next_local_version: None,
        })
    }

    /// Full release: gate, confirm, build, push, tag, bump.
    pub fn release<R: Repository>(&self, repo: &R, up_step: UpStep) -> Result<WorkflowResult> {
        let plan = Plan::Release { up_step };
        let target = plan.target(self.manifest)?;
        let bumped = self.manifest.with_bumped_local_version()?;
        let version = target.version_string();
        let remote = self.manifest.remote.as_str();

        ui::display_status(&format!(
            "Checking repository state against {}/{}...",
            remote, self.manifest.main_branch
        ));
        match RepositoryGate::new(repo, remote).authorize_release(&self.manifest.main_branch)? {
            GateDecision::Approved => ui::display_success("Repository is ready for release"),
            GateDecision::Denied(denial) => return Err(ReleaseError::GateDenied(denial)),
        }

        ui::display_target(&target, Some(bumped.local_version));
        match self.prompt.confirm(&format!("Release {}?", version))? {
            Confirmation::Confirmed => {}
            Confirmation::Declined => return Err(ReleaseError::aborted("release declined")),
            Confirmation::TimedOut => {
                return Err(ReleaseError::aborted("no confirmation before the timeout"))
            }
        }

        self.build(&target)?;
        self.push(&target)?;

        ui::display_status(&format!("Creating tag: {}", version));
        if let Err(e) = repo.create_annotated_tag(&version, &format!("Release {}", version)) {
            ui::display_partial_release(&target.docker_tag, &version, remote, false);
            return Err(ReleaseError::step(Step::Tag, e.to_string()));
        }
        if let Err(e) = repo.push_tag(remote, &version) {
            ui::display_partial_release(&target.docker_tag, &version, remote, true);
            return Err(ReleaseError::step(Step::Tag, e.to_string()));
        }
        ui::display_success(&format!("Pushed tag {} to {}", version, remote));

        ui::display_status(&format!(
            "Bumping local version to {}",
            bumped.local_version
        ));
        if let Err(e) = bumped.persist(self.manifest_path, repo) {
            ui::display_unfinished_bump(
                e.stage,
                self.manifest_path,
                &bumped.local_version,
                remote,
                &self.manifest.main_branch,
            );
            return Err(ReleaseError::step(Step::VersionBump, e.to_string()));
        }
        ui::display_success(&format!(
            "Local version is now {}",
            bumped.local_version
        ));

        info!(version = %version, tag = %target.docker_tag, "release finished");
        Ok(WorkflowResult {
            target,
            built: true,
            pushed: true,
            tagged: true,
            next_local_version: Some(bumped.local_version),
        })
    }

    fn build(&self, target: &ReleaseTarget) -> Result<()> {
        ui::display_status(&format!("Running build: {}", self.manifest.build_command));
        self.tools
            .build_artifact(&self.manifest.build_command, &BuildInput::for_target(target))?;

        ui::display_status(&format!("Building image {}", target.docker_tag));
        self.tools
            .build_image(Path::new(&self.manifest.dockerfile), &target.docker_tag)?;
        ui::display_success(&format!("Built {}", target.docker_tag));
        Ok(())
    }

    fn push(&self, target: &ReleaseTarget) -> Result<()> {
        ui::display_status(&format!("Pushing image {}", target.docker_tag));
        self.tools.push_image(&target.docker_tag)?;
        ui::display_success(&format!("Pushed {}", target.docker_tag));
        Ok(())
    }
}
