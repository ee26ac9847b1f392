//! Repository safety gate for release mode.
//!
//! The gate decides whether a release may start; it never builds or mutates
//! anything. Checks run in a fixed order (branch, behind, ahead, clean) and
//! the first failing one is reported.

use std::fmt;

use tracing::{debug, info};

use crate::error::Result;
use crate::git::{Repository, SyncStatus};

/// Why the gate refused a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// HEAD is not on the main branch (or is detached)
    WrongBranch {
        expected: String,
        actual: Option<String>,
    },
    /// The remote has commits the local branch lacks
    Behind { remote_branch: String, commits: usize },
    /// The local branch has commits the remote lacks
    Ahead { remote_branch: String, commits: usize },
    /// Tracked files are modified or staged
    DirtyWorkingTree,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::WrongBranch { expected, actual } => write!(
                f,
                "releases are only allowed from '{}', current branch is {}",
                expected,
                actual
                    .as_deref()
                    .map(|b| format!("'{}'", b))
                    .unwrap_or_else(|| "a detached HEAD".to_string())
            ),
            Denial::Behind {
                remote_branch,
                commits,
            } => write!(
                f,
                "local branch is {} commit(s) behind {}; pull first",
                commits, remote_branch
            ),
            Denial::Ahead {
                remote_branch,
                commits,
            } => write!(
                f,
                "local branch is {} commit(s) ahead of {}; push first",
                commits, remote_branch
            ),
            Denial::DirtyWorkingTree => {
                write!(f, "working tree has uncommitted changes to tracked files")
            }
        }
    }
}

/// Outcome of [RepositoryGate::authorize_release]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Approved,
    Denied(Denial),
}

impl GateDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, GateDecision::Approved)
    }
}

/// Queries repository state and evaluates the release predicate
pub struct RepositoryGate<'a, R: Repository> {
    repo: &'a R,
    remote: &'a str,
}

impl<'a, R: Repository> RepositoryGate<'a, R> {
    pub fn new(repo: &'a R, remote: &'a str) -> Self {
        RepositoryGate { repo, remote }
    }

    /// The presently checked-out branch, `None` when HEAD is detached
    pub fn current_branch(&self) -> Result<Option<String>> {
        self.repo.current_branch()
    }

    /// Fetch the remote, then count commits behind and ahead of `branch`
    pub fn sync_status(&self, branch: &str) -> Result<SyncStatus> {
        self.repo.fetch(self.remote)?;
        self.repo.sync_counts(self.remote, branch)
    }

    pub fn is_clean(&self) -> Result<bool> {
        self.repo.is_clean()
    }

    /// Evaluate the gate for a release from `main_branch`.
    ///
    /// Git failures (missing remote, unreachable network) are errors, not
    /// denials.
    pub fn authorize_release(&self, main_branch: &str) -> Result<GateDecision> {
        let current = self.current_branch()?;
        if current.as_deref() != Some(main_branch) {
            return Ok(self.deny(Denial::WrongBranch {
                expected: main_branch.to_string(),
                actual: current,
            }));
        }

        let remote_branch = format!("{}/{}", self.remote, main_branch);
        let status = self.sync_status(main_branch)?;
        debug!(
            behind = status.behind,
            ahead = status.ahead,
            "sync status against {}",
            remote_branch
        );

        if status.behind > 0 {
            return Ok(self.deny(Denial::Behind {
                remote_branch,
                commits: status.behind,
            }));
        }

        if status.ahead > 0 {
            return Ok(self.deny(Denial::Ahead {
                remote_branch,
                commits: status.ahead,
            }));
        }

        if !self.is_clean()? {
            return Ok(self.deny(Denial::DirtyWorkingTree));
        }

        info!(branch = main_branch, "release gate approved");
        Ok(GateDecision::Approved)
    }

    fn deny(&self, denial: Denial) -> GateDecision {
        info!(reason = %denial, "release gate denied");
        GateDecision::Denied(denial)
    }
}
