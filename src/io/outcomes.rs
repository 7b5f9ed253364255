//! Confirmed-outcome feed.
//!
//! The record store that keeps served predictions (and, eventually, what really
//! happened) lives outside this crate. `OutcomeSource` is the seam; the JSON
//! feed file is the concrete source used by the CLI.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::OutcomeRecord;
use crate::error::TrainingError;

/// Anything that can hand over the stored prediction records.
///
/// Sources return every record they hold; callers filter on `is_confirmed()`.
pub trait OutcomeSource {
    fn fetch_outcomes(&self) -> Result<Vec<OutcomeRecord>, TrainingError>;
}

impl OutcomeSource for Vec<OutcomeRecord> {
    fn fetch_outcomes(&self) -> Result<Vec<OutcomeRecord>, TrainingError> {
        Ok(self.clone())
    }
}

/// A JSON array of `OutcomeRecord`s on disk.
#[derive(Debug, Clone)]
pub struct JsonOutcomeFeed {
    path: PathBuf,
}

impl JsonOutcomeFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutcomeSource for JsonOutcomeFeed {
    fn fetch_outcomes(&self) -> Result<Vec<OutcomeRecord>, TrainingError> {
        let file = File::open(&self.path).map_err(|e| TrainingError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let records: Vec<OutcomeRecord> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| TrainingError::Malformed {
                line: e.line(),
                message: format!("invalid outcome feed '{}': {e}", self.path.display()),
            })?;

        let confirmed = records.iter().filter(|r| r.is_confirmed()).count();
        info!(
            path = %self.path.display(),
            records = records.len(),
            confirmed,
            "read outcome feed"
        );
        Ok(records)
    }
}
