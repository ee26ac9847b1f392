use std::fs;
use std::path::Path;

use git2::{IndexAddOption, Oid, RepositoryInitOptions, ResetType};
use tempfile::TempDir;

use dock_release::gate::{Denial, GateDecision, RepositoryGate};
use dock_release::git::{Git2Repository, Repository};
use dock_release::ReleaseError;

/// A working repository on `master` with a bare `origin` next to it
struct Fixture {
    _root: TempDir,
    work: std::path::PathBuf,
    origin: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let work = root.path().join("work");
    let origin = root.path().join("origin.git");

    let mut options = RepositoryInitOptions::new();
    options.initial_head("master");
    let repo = git2::Repository::init_opts(&work, &options).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Release Bot").unwrap();
        config.set_str("user.email", "release@example.com").unwrap();
    }
    git2::Repository::init_bare(&origin).unwrap();
    repo.remote("origin", origin.to_str().unwrap()).unwrap();

    fs::write(work.join("release.toml"), "klarrio = \"1.0.0\"\n").unwrap();
    commit_all(&repo, "initial");

    Fixture {
        _root: root,
        work,
        origin,
    }
}

impl Fixture {
    fn raw(&self) -> git2::Repository {
        git2::Repository::open(&self.work).unwrap()
    }

    fn open(&self) -> Git2Repository {
        Git2Repository::discover(&self.work).unwrap()
    }

    fn origin_ref(&self, name: &str) -> Option<Oid> {
        git2::Repository::open_bare(&self.origin)
            .unwrap()
            .refname_to_id(name)
            .ok()
    }
}

fn commit_all(repo: &git2::Repository, message: &str) -> Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = repo.signature().unwrap();

    let parents: Vec<git2::Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parents: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap()
}

fn write_and_commit(repo: &git2::Repository, file: &Path, content: &str, message: &str) -> Oid {
    fs::write(file, content).unwrap();
    commit_all(repo, message)
}

#[test]
fn test_current_branch() {
    let fx = fixture();
    assert_eq!(fx.open().current_branch().unwrap(), Some("master".to_string()));
}

#[test]
fn test_detached_head_has_no_branch() {
    let fx = fixture();
    let raw = fx.raw();
    let head = raw.head().unwrap().target().unwrap();
    raw.set_head_detached(head).unwrap();

    assert_eq!(fx.open().current_branch().unwrap(), None);
}

#[test]
fn test_clean_ignores_untracked_files() {
    let fx = fixture();
    let repo = fx.open();
    assert!(repo.is_clean().unwrap());

    fs::write(fx.work.join("notes.txt"), "scratch").unwrap();
    assert!(repo.is_clean().unwrap());

    fs::write(fx.work.join("release.toml"), "klarrio = \"1.0.1\"\n").unwrap();
    assert!(!repo.is_clean().unwrap());
}

#[test]
fn test_sync_counts_after_fetch() {
    let fx = fixture();
    let repo = fx.open();
    repo.push_branch("origin", "master").unwrap();

    repo.fetch("origin").unwrap();
    let status = repo.sync_counts("origin", "master").unwrap();
    assert!(status.is_in_sync());

    let raw = fx.raw();
    write_and_commit(&raw, &fx.work.join("a.txt"), "a", "local work");
    let status = repo.sync_counts("origin", "master").unwrap();
    assert_eq!((status.behind, status.ahead), (0, 1));
}

#[test]
fn test_behind_after_remote_moves_on() {
    let fx = fixture();
    let raw = fx.raw();
    let first = raw.head().unwrap().peel_to_commit().unwrap();
    write_and_commit(&raw, &fx.work.join("a.txt"), "a", "second");

    let repo = fx.open();
    repo.push_branch("origin", "master").unwrap();
    raw.reset(first.as_object(), ResetType::Hard, None).unwrap();

    let decision = RepositoryGate::new(&repo, "origin")
        .authorize_release("master")
        .unwrap();
    assert_eq!(
        decision,
        GateDecision::Denied(Denial::Behind {
            remote_branch: "origin/master".to_string(),
            commits: 1,
        })
    );
}

#[test]
fn test_gate_approves_synced_clean_repository() {
    let fx = fixture();
    let repo = fx.open();
    repo.push_branch("origin", "master").unwrap();

    let decision = RepositoryGate::new(&repo, "origin")
        .authorize_release("master")
        .unwrap();
    assert!(decision.is_approved());
}

#[test]
fn test_missing_remote_branch_is_an_error() {
    let fx = fixture();
    let repo = fx.open();

    repo.fetch("origin").unwrap();
    let err = repo.sync_counts("origin", "master").unwrap_err();
    assert!(matches!(err, ReleaseError::Remote(_)), "{:?}", err);
}

#[test]
fn test_unknown_remote_is_an_error() {
    let fx = fixture();
    let err = fx.open().fetch("upstream").unwrap_err();
    assert!(matches!(err, ReleaseError::Remote(_)));
}

#[test]
fn test_annotated_tag_created_and_pushed() {
    let fx = fixture();
    let repo = fx.open();
    repo.create_annotated_tag("3.0.0-1.1.0", "Release 3.0.0-1.1.0")
        .unwrap();

    let raw = fx.raw();
    let tag_ref = raw.find_reference("refs/tags/3.0.0-1.1.0").unwrap();
    let tag = tag_ref.peel_to_tag().unwrap();
    assert_eq!(tag.message(), Some("Release 3.0.0-1.1.0"));
    assert_eq!(
        tag.target_id(),
        raw.head().unwrap().target().unwrap()
    );

    repo.push_tag("origin", "3.0.0-1.1.0").unwrap();
    assert_eq!(
        fx.origin_ref("refs/tags/3.0.0-1.1.0"),
        Some(tag.id())
    );
}

#[test]
fn test_duplicate_tag_is_rejected() {
    let fx = fixture();
    let repo = fx.open();
    repo.create_annotated_tag("1.0.0-0.1.0", "first").unwrap();
    assert!(repo.create_annotated_tag("1.0.0-0.1.0", "again").is_err());
}

#[test]
fn test_commit_file_and_push_branch() {
    let fx = fixture();
    let repo = fx.open();
    let manifest = fx.work.join("release.toml");
    fs::write(&manifest, "klarrio = \"1.0.1\"\n").unwrap();
    fs::write(fx.work.join("unrelated.txt"), "leave me").unwrap();

    repo.commit_file(&manifest, "[dock-release] Bump local version to 1.0.1")
        .unwrap();
    repo.push_branch("origin", "master").unwrap();

    let raw = fx.raw();
    let head = raw.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(
        head.message(),
        Some("[dock-release] Bump local version to 1.0.1")
    );
    assert!(head
        .tree()
        .unwrap()
        .get_name("unrelated.txt")
        .is_none());
    assert_eq!(fx.origin_ref("refs/heads/master"), Some(head.id()));
    assert!(repo.is_clean().unwrap());
}

#[test]
fn test_commit_file_outside_repository_fails() {
    let fx = fixture();
    let outside = TempDir::new().unwrap();
    let stray = outside.path().join("release.toml");
    fs::write(&stray, "x").unwrap();

    assert!(fx.open().commit_file(&stray, "nope").is_err());
}
