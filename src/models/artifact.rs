//! The persisted, versioned model.
//!
//! A `ModelArtifact` is immutable once built. Scoring only ever reads it through
//! an `Arc`, and a retrain produces a brand new artifact rather than mutating one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::domain::{FeatureRecord, PredictionResult};
use crate::error::PredictError;
use crate::models::pipeline::CreditPipeline;
use crate::prep::FeatureSplit;

/// Bumped whenever the on-disk layout changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Diagnostics captured at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub rows: usize,
    pub positives: usize,
    /// Rows that came from confirmed outcomes rather than the historical dataset.
    pub confirmed_rows: usize,
    pub split: FeatureSplit,
    pub encoded_width: usize,
    pub iterations: usize,
    pub converged: bool,
    pub train_log_loss: f64,
    pub train_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Training timestamp in milliseconds. Runs within the same millisecond share it.
    pub version: i64,
    pub trained_at: DateTime<Utc>,
    /// Exact input column names the transform reads, in frame order.
    pub feature_columns: Vec<String>,
    pub pipeline: CreditPipeline,
    pub summary: TrainingSummary,
}

impl ModelArtifact {
    pub fn new(pipeline: CreditPipeline, summary: TrainingSummary, trained_at: DateTime<Utc>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            version: trained_at.timestamp_millis(),
            trained_at,
            feature_columns: pipeline.transform.input_columns(),
            pipeline,
            summary,
        }
    }

    /// Score one record.
    pub fn score(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictError> {
        let frame = Dataset::from_records(std::slice::from_ref(record), None)
            .select(&self.feature_columns)
            .map_err(PredictError::Scoring)?;
        let proba = self
            .pipeline
            .predict_proba(&frame)
            .map_err(|e| PredictError::Scoring(e.to_string()))?;
        let [p0, p1] = proba
            .first()
            .copied()
            .ok_or_else(|| PredictError::Scoring("pipeline returned no rows".to_string()))?;
        Ok(PredictionResult::from_proba(p0, p1))
    }
}
