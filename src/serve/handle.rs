//! Shared ownership of the currently served model.
//!
//! Readers take an `Arc` snapshot and score against it without holding the lock,
//! so a concurrent publish never disturbs an in-flight prediction. A new artifact
//! is only swapped in once it is fully built.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::error::ModelUnavailableError;
use crate::io::read_artifact;
use crate::models::ModelArtifact;

#[derive(Debug)]
pub struct ModelHandle {
    path: PathBuf,
    current: RwLock<Option<Arc<ModelArtifact>>>,
}

impl ModelHandle {
    /// A handle that loads lazily on first `get_or_load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
        }
    }

    /// Load eagerly; a missing or unreadable artifact is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ModelUnavailableError> {
        let handle = Self::new(path);
        handle.reload()?;
        Ok(handle)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the loaded artifact, if any.
    pub fn current(&self) -> Option<Arc<ModelArtifact>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get_or_load(&self) -> Result<Arc<ModelArtifact>, ModelUnavailableError> {
        if let Some(artifact) = self.current() {
            return Ok(artifact);
        }

        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have loaded it while we waited for the write lock.
        if let Some(artifact) = slot.as_ref() {
            return Ok(Arc::clone(artifact));
        }
        let artifact = Arc::new(read_artifact(&self.path)?);
        *slot = Some(Arc::clone(&artifact));
        info!(path = %self.path.display(), version = artifact.version, "loaded model");
        Ok(artifact)
    }

    /// Re-read the artifact from disk. On failure the previous model stays in place.
    pub fn reload(&self) -> Result<Arc<ModelArtifact>, ModelUnavailableError> {
        let artifact = match read_artifact(&self.path) {
            Ok(artifact) => Arc::new(artifact),
            Err(e) => {
                if self.current().is_some() {
                    warn!(error = %e, "reload failed; keeping the current model");
                }
                return Err(e);
            }
        };
        self.swap(Arc::clone(&artifact));
        Ok(artifact)
    }

    /// Serve a freshly trained artifact.
    pub fn publish(&self, artifact: ModelArtifact) -> Arc<ModelArtifact> {
        let artifact = Arc::new(artifact);
        self.swap(Arc::clone(&artifact));
        artifact
    }

    fn swap(&self, artifact: Arc<ModelArtifact>) {
        let version = artifact.version;
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(artifact);
        info!(
            version,
            previous = previous.map(|a| a.version),
            "model swapped in"
        );
    }
}
