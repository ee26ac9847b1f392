use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use toml_edit::{value, DocumentMut};
use tracing::{debug, info};

use crate::domain::{SemVer, UpStep};
use crate::error::{ReleaseError, Result};
use crate::git::Repository;

/// Manifest file looked up in the working directory when none is given
pub const DEFAULT_MANIFEST: &str = "release.toml";

const DEFAULT_DOCKERFILE: &str = "Dockerfile";
const DEFAULT_MAIN_BRANCH: &str = "master";
const DEFAULT_REMOTE: &str = "origin";

/// On-disk shape of the manifest, before required fields are checked.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    docker_repository: Option<String>,
    #[serde(default)]
    version: RawVersion,
    build_command: Option<String>,
    docker_file: Option<String>,
    main_branch: Option<String>,
    remote: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawVersion {
    upstream: Option<String>,
    klarrio: Option<String>,
}

/// Stage of [Manifest::persist] that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    /// The file was not changed
    Write,
    /// The file holds the new version but is not committed
    Commit,
    /// The bump is committed locally but not on the remote
    Push,
}

impl fmt::Display for PersistStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersistStage::Write => "writing the manifest",
            PersistStage::Commit => "committing the manifest",
            PersistStage::Push => "pushing the bump commit",
        };
        f.write_str(name)
    }
}

/// Failure of [Manifest::persist], tagged with the stage it stopped at
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct PersistError {
    pub stage: PersistStage,
    #[source]
    pub error: ReleaseError,
}

impl PersistError {
    pub fn new(stage: PersistStage, error: ReleaseError) -> Self {
        PersistError { stage, error }
    }
}

/// The project's build and versioning configuration.
///
/// `local_version` is the only field ever written back, and only by
/// [Manifest::persist] at the end of a successful release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub docker_repository: String,
    /// Opaque upstream version, not necessarily semver
    pub upstream_version: String,
    pub local_version: SemVer,
    pub build_command: String,
    pub dockerfile: String,
    pub main_branch: String,
    pub remote: String,
}

/// Treats an absent or empty value as missing
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    present(value).ok_or_else(|| {
        ReleaseError::config(format!("missing required field '{}'", field))
    })
}

impl Manifest {
    /// Loads the manifest from `path`.
    ///
    /// # Returns
    /// * `Ok(Manifest)` - All required fields present, defaults applied
    /// * `Err(Config)` - File unreadable, unparsable, or a required field is
    ///   absent or empty
    /// * `Err(Format)` - `version.klarrio` is not a strict `X.Y.Z`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReleaseError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let manifest = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), version = %manifest.local_version, "loaded manifest");
        Ok(manifest)
    }

    /// Parses manifest text, applying the documented defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)
            .map_err(|e| ReleaseError::config(format!("invalid manifest: {}", e)))?;

        let docker_repository = required(raw.docker_repository, "dockerRepository")?;
        let upstream_version = required(raw.version.upstream, "version.upstream")?;
        let local_version = SemVer::parse(&required(raw.version.klarrio, "version.klarrio")?)?;
        let build_command = required(raw.build_command, "buildCommand")?;

        Ok(Manifest {
            docker_repository,
            upstream_version,
            local_version,
            build_command,
            dockerfile: present(raw.docker_file)
                .unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string()),
            main_branch: present(raw.main_branch)
                .unwrap_or_else(|| DEFAULT_MAIN_BRANCH.to_string()),
            remote: present(raw.remote).unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
        })
    }

    /// Copy of this manifest with the local version's revision incremented
    pub fn with_bumped_local_version(&self) -> Result<Self> {
        Ok(Manifest {
            local_version: self.local_version.increment(UpStep::Revision)?,
            ..self.clone()
        })
    }

    /// Commit message used for the version bump
    pub fn bump_message(&self) -> String {
        format!(
            "[dock-release] Bump local version to {}",
            self.local_version
        )
    }

    /// Rewrite `version.klarrio` in the file at `path`, leaving every other
    /// byte alone, then commit that file and push the main branch.
    ///
    /// Stops at the first failing stage; the error names it so the caller
    /// knows how far the change got.
    pub fn persist<R: Repository>(
        &self,
        path: &Path,
        repo: &R,
    ) -> std::result::Result<(), PersistError> {
        self.write_local_version(path)
            .map_err(|error| PersistError::new(PersistStage::Write, error))?;
        repo.commit_file(path, &self.bump_message())
            .map_err(|error| PersistError::new(PersistStage::Commit, error))?;
        repo.push_branch(&self.remote, &self.main_branch)
            .map_err(|error| PersistError::new(PersistStage::Push, error))?;

        info!(version = %self.local_version, "persisted local version");
        Ok(())
    }

    /// Replace the file at `path` with a copy whose local version is ours.
    ///
    /// The new content goes to a temp file in the same directory which is
    /// then renamed over the original.
    pub fn write_local_version(&self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let mut doc: DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
            ReleaseError::config(format!("cannot parse {}: {}", path.display(), e))
        })?;

        let item = doc
            .get_mut("version")
            .and_then(|item| item.as_table_like_mut())
            .and_then(|table| table.get_mut("klarrio"))
            .ok_or_else(|| ReleaseError::config("missing required field 'version.klarrio'"))?;

        let decor = item.as_value().map(|v| v.decor().clone());
        *item = value(self.local_version.to_string());
        if let (Some(decor), Some(new_value)) = (decor, item.as_value_mut()) {
            *new_value.decor_mut() = decor;
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(doc.to_string().as_bytes())?;
        tmp.as_file().sync_all()?;
        fs::set_permissions(tmp.path(), fs::metadata(path)?.permissions())?;
        tmp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}
