//! Model training.
//!
//! `ModelTrainer::train` runs the full procedure:
//!
//! 1. clean the raw codes
//! 2. drop the pass-through `id`
//! 3. validate the label and split it off
//! 4. segregate numeric vs categorical columns
//! 5. jointly fit the transform and the classifier
//! 6. persist the artifact atomically and publish it to the serving handle
//!
//! Any failure leaves the previously published artifact untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::data::Dataset;
use crate::domain::{ID_COLUMN, LABEL_COLUMN, TrainParams};
use crate::error::TrainingError;
use crate::io::{TrainingLock, write_artifact};
use crate::models::{CreditPipeline, ModelArtifact, TrainingSummary};
use crate::prep::{clean, segregate};
use crate::serve::ModelHandle;

/// Probabilities are clamped to this distance from 0 and 1 for log-loss.
const LOG_LOSS_EPS: f64 = 1e-15;

#[derive(Debug, Clone)]
pub struct ModelTrainer {
    artifact_path: PathBuf,
    params: TrainParams,
    handle: Option<Arc<ModelHandle>>,
}

impl ModelTrainer {
    pub fn new(artifact_path: impl Into<PathBuf>, params: TrainParams) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            params,
            handle: None,
        }
    }

    /// Also swap every successfully persisted artifact into `handle`.
    pub fn with_handle(mut self, handle: Arc<ModelHandle>) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn params(&self) -> &TrainParams {
        &self.params
    }

    /// Train, persist and publish.
    pub fn train(&self, dataset: Dataset) -> Result<ModelArtifact, TrainingError> {
        self.train_counting(dataset, 0)
    }

    /// Same as `train`, recording how many rows came from confirmed outcomes.
    pub(crate) fn train_counting(&self, dataset: Dataset, confirmed_rows: usize) -> Result<ModelArtifact, TrainingError> {
        let _lock = TrainingLock::acquire(&self.artifact_path)?;

        let mut artifact = self.fit(dataset)?;
        artifact.summary.confirmed_rows = confirmed_rows;

        write_artifact(&self.artifact_path, &artifact)?;
        if let Some(handle) = &self.handle {
            handle.publish(artifact.clone());
        }
        Ok(artifact)
    }

    /// Run the training procedure without persisting anything.
    pub fn fit(&self, dataset: Dataset) -> Result<ModelArtifact, TrainingError> {
        if !dataset.has_column(LABEL_COLUMN) {
            return Err(TrainingError::MissingLabel(LABEL_COLUMN.to_string()));
        }

        let dataset = clean(dataset).without(&[ID_COLUMN]);
        if dataset.n_rows() == 0 {
            return Err(TrainingError::EmptyDataset);
        }

        let labels = extract_labels(&dataset)?;
        let features = dataset.without(&[LABEL_COLUMN]);

        let split = segregate(&features, self.params.cardinality_threshold);
        debug!(numeric = ?split.numeric, categorical = ?split.categorical, "segregated features");

        let pipeline = CreditPipeline::fit(&split, &features, &labels, &self.params)?;
        if !pipeline.classifier.converged {
            warn!(
                iterations = pipeline.classifier.iterations,
                max_iter = self.params.max_iter,
                "solver stopped before reaching the gradient tolerance"
            );
        }

        let proba = pipeline
            .predict_proba(&features)
            .map_err(|e| TrainingError::Transform(e.to_string()))?;
        let summary = TrainingSummary {
            rows: labels.len(),
            positives: labels.iter().filter(|&&y| y == 1.0).count(),
            confirmed_rows: 0,
            split,
            encoded_width: pipeline.transform.output_width(),
            iterations: pipeline.classifier.iterations,
            converged: pipeline.classifier.converged,
            train_log_loss: log_loss(&labels, &proba),
            train_accuracy: accuracy(&labels, &proba),
        };

        let artifact = ModelArtifact::new(pipeline, summary, Utc::now());
        info!(
            version = artifact.version,
            rows = artifact.summary.rows,
            positives = artifact.summary.positives,
            width = artifact.summary.encoded_width,
            log_loss = artifact.summary.train_log_loss,
            "trained model"
        );
        Ok(artifact)
    }
}

/// Pull the label column as 0.0/1.0, requiring both classes.
fn extract_labels(dataset: &Dataset) -> Result<Vec<f64>, TrainingError> {
    let column = dataset
        .column(LABEL_COLUMN)
        .ok_or_else(|| TrainingError::MissingLabel(LABEL_COLUMN.to_string()))?;
    let values = column.as_numeric().ok_or_else(|| TrainingError::InvalidLabel {
        row: 0,
        message: format!("`{LABEL_COLUMN}` must be numeric 0/1, found text"),
    })?;

    let mut labels = Vec::with_capacity(values.len());
    for (row, value) in values.iter().enumerate() {
        match value {
            Some(v) if *v == 0.0 || *v == 1.0 => labels.push(*v),
            Some(v) => {
                return Err(TrainingError::InvalidLabel {
                    row,
                    message: format!("expected 0 or 1, got {v}"),
                });
            }
            None => {
                return Err(TrainingError::InvalidLabel {
                    row,
                    message: "missing label".to_string(),
                });
            }
        }
    }

    let positives = labels.iter().filter(|&&y| y == 1.0).count();
    if positives == 0 {
        return Err(TrainingError::SingleClass(0));
    }
    if positives == labels.len() {
        return Err(TrainingError::SingleClass(1));
    }
    Ok(labels)
}

fn log_loss(labels: &[f64], proba: &[[f64; 2]]) -> f64 {
    let total: f64 = labels
        .iter()
        .zip(proba)
        .map(|(&y, &[_, p1])| {
            let p = p1.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / labels.len().max(1) as f64
}

fn accuracy(labels: &[f64], proba: &[[f64; 2]]) -> f64 {
    let hits = labels
        .iter()
        .zip(proba)
        .filter(|(y, [p0, p1])| (p1 > p0) == (**y == 1.0))
        .count();
    hits as f64 / labels.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, generate_history};
    use tempfile::TempDir;

    fn trainer(dir: &TempDir) -> ModelTrainer {
        ModelTrainer::new(dir.path().join("model.json"), TrainParams::default())
    }

    #[test]
    fn fit_drops_id_and_records_split() {
        let dir = TempDir::new().unwrap();
        let artifact = trainer(&dir).fit(generate_history(400, 3).unwrap()).unwrap();

        assert!(!artifact.feature_columns.iter().any(|c| c == ID_COLUMN));
        assert!(!artifact.feature_columns.iter().any(|c| c == LABEL_COLUMN));
        assert_eq!(artifact.summary.rows, 400);
        assert!(artifact.summary.split.categorical.contains(&"education".to_string()));
        assert!(artifact.summary.split.numeric.contains(&"limit_bal".to_string()));
        assert!(artifact.summary.converged);
        assert!(!dir.path().join("model.json").exists());
    }

    #[test]
    fn train_persists_and_releases_lock() {
        let dir = TempDir::new().unwrap();
        let trainer = trainer(&dir);
        trainer.train(generate_history(300, 5).unwrap()).unwrap();
        assert!(trainer.artifact_path().exists());
        assert!(!crate::io::lock_path(trainer.artifact_path()).exists());
    }

    #[test]
    fn missing_label_column() {
        let dir = TempDir::new().unwrap();
        let ds = generate_history(20, 1).unwrap().without(&[LABEL_COLUMN]);
        assert!(matches!(trainer(&dir).fit(ds), Err(TrainingError::MissingLabel(_))));
    }

    #[test]
    fn zero_rows() {
        let dir = TempDir::new().unwrap();
        let ds = Dataset::new(vec![
            Column::numeric("age", vec![]),
            Column::numeric(LABEL_COLUMN, vec![]),
        ])
        .unwrap();
        assert!(matches!(trainer(&dir).fit(ds), Err(TrainingError::EmptyDataset)));
    }

    #[test]
    fn labels_must_be_binary_and_present() {
        let dir = TempDir::new().unwrap();
        let bad = Dataset::new(vec![
            Column::numeric("age", vec![Some(30.0), Some(40.0), Some(50.0)]),
            Column::numeric(LABEL_COLUMN, vec![Some(0.0), Some(2.0), Some(1.0)]),
        ])
        .unwrap();
        assert!(matches!(trainer(&dir).fit(bad), Err(TrainingError::InvalidLabel { row: 1, .. })));

        let missing = Dataset::new(vec![
            Column::numeric("age", vec![Some(30.0), Some(40.0)]),
            Column::numeric(LABEL_COLUMN, vec![Some(0.0), None]),
        ])
        .unwrap();
        assert!(matches!(trainer(&dir).fit(missing), Err(TrainingError::InvalidLabel { row: 1, .. })));
    }

    #[test]
    fn single_class_is_rejected() {
        let dir = TempDir::new().unwrap();
        let ds = Dataset::new(vec![
            Column::numeric("age", vec![Some(30.0), Some(40.0)]),
            Column::numeric(LABEL_COLUMN, vec![Some(1.0), Some(1.0)]),
        ])
        .unwrap();
        assert!(matches!(trainer(&dir).fit(ds), Err(TrainingError::SingleClass(1))));
    }

    #[test]
    fn metrics_match_hand_computation() {
        let labels = [1.0, 0.0];
        let proba = [[0.2, 0.8], [0.6, 0.4]];
        let expected = -(0.8f64.ln() + 0.6f64.ln()) / 2.0;
        assert!((log_loss(&labels, &proba) - expected).abs() < 1e-12);
        assert_eq!(accuracy(&labels, &proba), 1.0);
    }
}
