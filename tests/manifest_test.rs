use std::fs;

use tempfile::TempDir;

use dock_release::domain::SemVer;
use dock_release::git::MockRepository;
use dock_release::manifest::{Manifest, PersistStage};
use dock_release::ReleaseError;

const ANNOTATED: &str = r#"# Project release manifest
dockerRepository = "registry.example.com/team/app"   # where images go
buildCommand     = "./gradlew clean build"
mainBranch       = "main"

# Do not edit upstream by hand
[version]
upstream = "2.8.1-cp3"
klarrio  =   "0.9.12"  # bumped by the release tool

[extra]
owner = "platform"
"#;

fn write_manifest(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("release.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_load_from_file() {
    let (_dir, path) = write_manifest(ANNOTATED);
    let manifest = Manifest::load(&path).unwrap();

    assert_eq!(manifest.upstream_version, "2.8.1-cp3");
    assert_eq!(manifest.local_version, SemVer::new(0, 9, 12));
    assert_eq!(manifest.main_branch, "main");
    assert_eq!(manifest.remote, "origin");
    assert_eq!(manifest.dockerfile, "Dockerfile");
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = Manifest::load(&dir.path().join("release.toml")).unwrap_err();
    assert!(matches!(err, ReleaseError::Config(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let (_dir, path) = write_manifest("dockerRepository = \n");
    assert!(matches!(
        Manifest::load(&path),
        Err(ReleaseError::Config(_))
    ));
}

#[test]
fn test_write_preserves_everything_but_local_version() {
    let (_dir, path) = write_manifest(ANNOTATED);
    let manifest = Manifest::load(&path).unwrap();

    manifest
        .with_bumped_local_version()
        .unwrap()
        .write_local_version(&path)
        .unwrap();

    let expected = ANNOTATED.replace("\"0.9.12\"", "\"0.9.13\"");
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
}

#[test]
fn test_write_leaves_no_temp_files_behind() {
    let (dir, path) = write_manifest(ANNOTATED);
    Manifest::load(&path)
        .unwrap()
        .with_bumped_local_version()
        .unwrap()
        .write_local_version(&path)
        .unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("release.toml")]);
}

#[cfg(unix)]
#[test]
fn test_write_keeps_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = write_manifest(ANNOTATED);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    Manifest::load(&path)
        .unwrap()
        .with_bumped_local_version()
        .unwrap()
        .write_local_version(&path)
        .unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
}

#[test]
fn test_persist_commits_and_pushes_main_branch() {
    let (_dir, path) = write_manifest(ANNOTATED);
    let repo = MockRepository::new("main");
    let bumped = Manifest::load(&path)
        .unwrap()
        .with_bumped_local_version()
        .unwrap();

    bumped.persist(&path, &repo).unwrap();

    assert_eq!(
        repo.commits(),
        vec![(
            path.clone(),
            "[dock-release] Bump local version to 0.9.13".to_string()
        )]
    );
    assert_eq!(repo.pushed_branches(), vec!["origin/main".to_string()]);
    assert_eq!(
        Manifest::load(&path).unwrap().local_version,
        SemVer::new(0, 9, 13)
    );
}

#[test]
fn test_persist_fails_when_field_vanished() {
    let (_dir, path) = write_manifest(ANNOTATED);
    let manifest = Manifest::load(&path).unwrap();
    fs::write(&path, "dockerRepository = \"r\"\n").unwrap();

    let repo = MockRepository::new("main");
    let err = manifest.persist(&path, &repo).unwrap_err();

    assert_eq!(err.stage, PersistStage::Write);
    assert!(matches!(err.error, ReleaseError::Config(_)));
    assert!(repo.commits().is_empty());
    assert!(repo.pushed_branches().is_empty());
}

#[test]
fn test_persist_commit_failure_leaves_file_bumped() {
    let (_dir, path) = write_manifest(ANNOTATED);
    let repo = MockRepository::new("main").failing_commit();
    let bumped = Manifest::load(&path)
        .unwrap()
        .with_bumped_local_version()
        .unwrap();

    let err = bumped.persist(&path, &repo).unwrap_err();

    assert_eq!(err.stage, PersistStage::Commit);
    assert!(err.to_string().starts_with("committing the manifest failed"));
    assert_eq!(
        Manifest::load(&path).unwrap().local_version,
        SemVer::new(0, 9, 13)
    );
    assert!(repo.pushed_branches().is_empty());
}

#[test]
fn test_persist_push_failure_keeps_local_commit() {
    let (_dir, path) = write_manifest(ANNOTATED);
    let repo = MockRepository::new("main").failing_branch_push();
    let bumped = Manifest::load(&path)
        .unwrap()
        .with_bumped_local_version()
        .unwrap();

    let err = bumped.persist(&path, &repo).unwrap_err();

    assert_eq!(err.stage, PersistStage::Push);
    assert!(matches!(err.error, ReleaseError::Remote(_)));
    assert_eq!(repo.commits().len(), 1);
}
