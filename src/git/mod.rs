//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the Git operations a
//! release needs, allowing the gate and the orchestrator to run against a
//! real repository or a scripted mock.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! Code that drives a release should depend on the [Repository] trait rather
//! than on a concrete implementation.
//!
//! ```rust
//! # use dock_release::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> dock_release::Result<()> {
//! repo.fetch("origin")?;
//! let status = repo.sync_counts("origin", "master")?;
//! println!("behind {}, ahead {}", status.behind, status.ahead);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::Path;

use crate::error::Result;

/// Commit counts of HEAD relative to a remote-tracking branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStatus {
    /// Commits reachable only from the remote branch
    pub behind: usize,
    /// Commits reachable only from HEAD
    pub ahead: usize,
}

impl SyncStatus {
    pub fn new(behind: usize, ahead: usize) -> Self {
        SyncStatus { behind, ahead }
    }

    pub fn is_in_sync(&self) -> bool {
        self.behind == 0 && self.ahead == 0
    }
}

/// Common git operation trait for abstraction
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to [crate::error::ReleaseError].
pub trait Repository {
    /// Name of the checked-out branch
    ///
    /// # Returns
    /// * `Ok(Some(name))` - HEAD points at a local branch
    /// * `Ok(None)` - HEAD is detached or the branch is unborn
    fn current_branch(&self) -> Result<Option<String>>;

    /// Refresh remote-tracking refs for every branch of `remote`
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Count commits between HEAD and `refs/remotes/<remote>/<branch>`
    ///
    /// Uses whatever remote-tracking state is present; call [Repository::fetch]
    /// first for an up to date answer.
    fn sync_counts(&self, remote: &str, branch: &str) -> Result<SyncStatus>;

    /// True when no tracked file is modified or staged.
    ///
    /// Untracked and ignored files do not make the tree dirty.
    fn is_clean(&self) -> Result<bool>;

    /// Create an annotated tag named `name` on HEAD
    ///
    /// # Returns
    /// * `Ok(())` - Success
    /// * `Err` - If the tag already exists or HEAD has no commit
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push `refs/tags/<name>` to `remote`
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;

    /// Stage exactly one file and commit it on HEAD with `message`
    fn commit_file(&self, path: &Path, message: &str) -> Result<()>;

    /// Push `refs/heads/<branch>` to `remote`
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;
}
