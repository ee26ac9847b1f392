use std::path::{Path, PathBuf};

use git2::{Cred, CredentialType, ErrorCode, FetchOptions, PushOptions, RemoteCallbacks};
use git2::{Repository as Git2Repo, Status, StatusOptions};
use tracing::{debug, info, instrument};

use crate::error::{ReleaseError, Result};
use crate::git::SyncStatus;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn relative_to_workdir(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ReleaseError::config("repository has no working directory"))?;

        let workdir = std::fs::canonicalize(workdir)?;
        let absolute = std::fs::canonicalize(path)?;

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ReleaseError::config(format!(
                    "{} is outside the repository at {}",
                    path.display(),
                    workdir.display()
                ))
            })
    }

    fn push_refspec(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;

        let mut callbacks = remote_callbacks();
        // A rejected ref is reported here rather than as a push error
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    ReleaseError::remote(format!("Network error during push: {}", e))
                } else {
                    ReleaseError::remote(format!("Push of {} failed: {}", refspec, e))
                }
            })?;

        Ok(())
    }
}

/// Credential lookup shared by fetch and push.
///
/// Tries the usual private keys under `~/.ssh/`, then the SSH agent, then
/// libgit2's default credentials.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                let path = Path::new(&home).join(".ssh").join(key);
                if path.exists() {
                    if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                        return Ok(cred);
                    }
                }
            }

            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        Cred::default()
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self))]
    fn fetch(&self, remote_name: &str) -> Result<()> {
        let start = std::time::Instant::now();
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks());

        let refspec = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
            .map_err(|e| ReleaseError::remote(format!("Fetch failed: {}", e)))?;

        info!(
            remote = remote_name,
            duration_ms = start.elapsed().as_millis(),
            "fetched from remote"
        );
        Ok(())
    }

    fn sync_counts(&self, remote: &str, branch: &str) -> Result<SyncStatus> {
        let head = self.repo.head()?.peel_to_commit()?.id();

        let tracking = format!("refs/remotes/{}/{}", remote, branch);
        let upstream = self.repo.refname_to_id(&tracking).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                ReleaseError::remote(format!(
                    "Remote branch {}/{} does not exist",
                    remote, branch
                ))
            } else {
                ReleaseError::Git(e)
            }
        })?;

        let (ahead, behind) = self.repo.graph_ahead_behind(head, upstream)?;
        debug!(remote, branch, ahead, behind, "computed sync status");

        Ok(SyncStatus::new(behind, ahead))
    }

    fn is_clean(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        let dirty = statuses
            .iter()
            .filter(|entry| entry.status() != Status::CURRENT)
            .count();

        debug!(dirty, "checked working tree");
        Ok(dirty == 0)
    }

    #[instrument(skip(self, message))]
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        let tagger = self.repo.signature()?;

        self.repo
            .tag(name, head.as_object(), &tagger, message, false)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    ReleaseError::Git(git2::Error::from_str(&format!(
                        "tag '{}' already exists",
                        name
                    )))
                } else {
                    ReleaseError::Git(e)
                }
            })?;

        info!(tag = name, commit = %head.id(), "created annotated tag");
        Ok(())
    }

    #[instrument(skip(self))]
    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        self.push_refspec(remote, &format!("refs/tags/{}:refs/tags/{}", name, name))?;
        info!(remote, tag = name, "pushed tag");
        Ok(())
    }

    #[instrument(skip(self, path, message), fields(path = %path.display()))]
    fn commit_file(&self, path: &Path, message: &str) -> Result<()> {
        let relative = self.relative_to_workdir(path)?;

        let mut index = self.repo.index()?;
        index.add_path(&relative)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.repo.head()?.peel_to_commit()?;
        let signature = self.repo.signature()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        info!(commit = %oid, "committed {}", relative.display());
        Ok(())
    }

    #[instrument(skip(self))]
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.push_refspec(
            remote,
            &format!("refs/heads/{}:refs/heads/{}", branch, branch),
        )?;
        info!(remote, branch, "pushed branch");
        Ok(())
    }
}
