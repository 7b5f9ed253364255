//! Model artifact persistence.
//!
//! Writes are atomic: the JSON goes to a temp file in the artifact's directory,
//! is fsynced, then renamed over the target. A reader sees either the old
//! artifact or the new one, never a partial file.
//!
//! Training runs additionally hold `<artifact>.lock` (see `TrainingLock`) so only
//! one writer touches a given artifact at a time.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{ModelUnavailableError, TrainingError};
use crate::models::{ARTIFACT_FORMAT_VERSION, ModelArtifact};

/// Atomically replace the artifact at `path`.
pub fn write_artifact(path: &Path, artifact: &ModelArtifact) -> Result<(), TrainingError> {
    let persist_err = |message: String| TrainingError::Persist {
        path: path.to_path_buf(),
        message,
    };

    let dir = parent_dir(path);
    fs::create_dir_all(dir).map_err(|e| persist_err(format!("cannot create directory: {e}")))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| persist_err(format!("cannot create temp file: {e}")))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, artifact).map_err(|e| persist_err(e.to_string()))?;
        writer.flush().map_err(|e| persist_err(e.to_string()))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| persist_err(format!("fsync failed: {e}")))?;
    tmp.persist(path).map_err(|e| persist_err(e.error.to_string()))?;

    info!(path = %path.display(), version = artifact.version, "published model artifact");
    Ok(())
}

/// Load an artifact. Any failure means there is no usable model at `path`.
pub fn read_artifact(path: &Path) -> Result<ModelArtifact, ModelUnavailableError> {
    let unavailable = |reason: String| ModelUnavailableError {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => unavailable("no artifact has been trained yet".to_string()),
        _ => unavailable(e.to_string()),
    })?;
    let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| unavailable(format!("invalid artifact JSON: {e}")))?;

    if artifact.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(unavailable(format!(
            "artifact format {} is not supported (expected {ARTIFACT_FORMAT_VERSION})",
            artifact.format_version
        )));
    }

    debug!(path = %path.display(), version = artifact.version, "loaded model artifact");
    Ok(artifact)
}

/// Path of the lock file guarding training runs for `artifact_path`.
pub fn lock_path(artifact_path: &Path) -> PathBuf {
    let mut name = OsString::from(artifact_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Exclusive claim on an artifact for the duration of a training run.
///
/// Dropping the guard releases the claim. A crashed process leaves the lock file
/// behind; it has to be removed by hand.
#[derive(Debug)]
pub struct TrainingLock {
    path: PathBuf,
}

impl TrainingLock {
    pub fn acquire(artifact_path: &Path) -> Result<Self, TrainingError> {
        let path = lock_path(artifact_path);
        fs::create_dir_all(parent_dir(&path)).map_err(|e| TrainingError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Owner pid, for whoever finds a stale lock.
                if let Err(e) = writeln!(file, "{}", std::process::id()) {
                    warn!(lock = %path.display(), error = %e, "failed to record owner pid in training lock");
                }
                debug!(lock = %path.display(), "acquired training lock");
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(TrainingError::InProgress(path)),
            Err(e) => Err(TrainingError::Io {
                path,
                message: e.to_string(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TrainingLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to release training lock");
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(lock_path(Path::new("models/model.json")), PathBuf::from("models/model.json.lock"));
    }

    #[test]
    fn second_lock_is_rejected_until_release() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("model.json");

        let first = TrainingLock::acquire(&artifact).unwrap();
        assert!(first.path().exists());
        assert!(matches!(TrainingLock::acquire(&artifact), Err(TrainingError::InProgress(_))));

        let owner = fs::read_to_string(first.path()).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());

        drop(first);
        assert!(!lock_path(&artifact).exists());
        assert!(TrainingLock::acquire(&artifact).is_ok());
    }

    #[test]
    fn missing_artifact_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = read_artifact(&dir.path().join("model.json")).unwrap_err();
        assert!(err.reason.contains("no artifact"));
    }

    #[test]
    fn corrupt_artifact_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_artifact(&path).unwrap_err();
        assert!(err.reason.contains("invalid artifact JSON"));
    }
}
