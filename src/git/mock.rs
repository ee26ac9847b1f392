use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};
use crate::git::{Repository, SyncStatus};

/// Mock repository for testing without actual git operations
///
/// Every mutating call is recorded so tests can assert on what a release did
/// and, just as often, on what it did not do.
pub struct MockRepository {
    branch: Option<String>,
    sync: SyncStatus,
    clean: bool,
    fail_tag_create: bool,
    fail_tag_push: bool,
    fail_commit: bool,
    fail_branch_push: bool,
    fetches: RefCell<Vec<String>>,
    tags: RefCell<Vec<(String, String)>>,
    pushed_tags: RefCell<Vec<String>>,
    commits: RefCell<Vec<(PathBuf, String)>>,
    pushed_branches: RefCell<Vec<String>>,
}

impl MockRepository {
    /// A repository on `branch`, in sync and clean
    pub fn new(branch: impl Into<String>) -> Self {
        MockRepository {
            branch: Some(branch.into()),
            sync: SyncStatus::default(),
            clean: true,
            fail_tag_create: false,
            fail_tag_push: false,
            fail_commit: false,
            fail_branch_push: false,
            fetches: RefCell::new(Vec::new()),
            tags: RefCell::new(Vec::new()),
            pushed_tags: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
            pushed_branches: RefCell::new(Vec::new()),
        }
    }

    /// A repository with a detached HEAD
    pub fn detached() -> Self {
        MockRepository {
            branch: None,
            ..MockRepository::new("")
        }
    }

    pub fn with_sync(mut self, behind: usize, ahead: usize) -> Self {
        self.sync = SyncStatus::new(behind, ahead);
        self
    }

    pub fn dirty(mut self) -> Self {
        self.clean = false;
        self
    }

    /// Make `create_annotated_tag` fail as an existing tag would
    pub fn failing_tag_create(mut self) -> Self {
        self.fail_tag_create = true;
        self
    }

    /// Make `push_tag` fail as a remote rejection would
    pub fn failing_tag_push(mut self) -> Self {
        self.fail_tag_push = true;
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn failing_branch_push(mut self) -> Self {
        self.fail_branch_push = true;
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.borrow().clone()
    }

    /// Created tags as `(name, message)` pairs
    pub fn tags(&self) -> Vec<(String, String)> {
        self.tags.borrow().clone()
    }

    pub fn pushed_tags(&self) -> Vec<String> {
        self.pushed_tags.borrow().clone()
    }

    /// Commits as `(path, message)` pairs
    pub fn commits(&self) -> Vec<(PathBuf, String)> {
        self.commits.borrow().clone()
    }

    pub fn pushed_branches(&self) -> Vec<String> {
        self.pushed_branches.borrow().clone()
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.fetches.borrow_mut().push(remote.to_string());
        Ok(())
    }

    fn sync_counts(&self, _remote: &str, _branch: &str) -> Result<SyncStatus> {
        Ok(self.sync)
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(self.clean)
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        if self.fail_tag_create {
            return Err(ReleaseError::Git(git2::Error::from_str(&format!(
                "tag '{}' already exists",
                name
            ))));
        }
        self.tags
            .borrow_mut()
            .push((name.to_string(), message.to_string()));
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        if self.fail_tag_push {
            return Err(ReleaseError::remote(format!(
                "remote {} rejected refs/tags/{}",
                remote, name
            )));
        }
        self.pushed_tags.borrow_mut().push(name.to_string());
        Ok(())
    }

    fn commit_file(&self, path: &Path, message: &str) -> Result<()> {
        if self.fail_commit {
            return Err(ReleaseError::Git(git2::Error::from_str(&format!(
                "cannot commit {}",
                path.display()
            ))));
        }
        self.commits
            .borrow_mut()
            .push((path.to_path_buf(), message.to_string()));
        Ok(())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        if self.fail_branch_push {
            return Err(ReleaseError::remote(format!(
                "remote {} rejected refs/heads/{}",
                remote, branch
            )));
        }
        self.pushed_branches
            .borrow_mut()
            .push(format!("{}/{}", remote, branch));
        Ok(())
    }
}
