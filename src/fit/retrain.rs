//! Retraining on historical data plus confirmed outcomes.
//!
//! Only prediction records whose real outcome has been confirmed take part; their
//! features are encoded with the canonical code tables and labelled with the
//! confirmed outcome. The combined table then goes through the normal training
//! path, so the result is persisted and published exactly like a fresh train.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::Dataset;
use crate::domain::{CategoricalDomain, Education, FeatureRecord, ID_COLUMN, Marriage, OutcomeRecord, Sex};
use crate::error::TrainingError;
use crate::fit::trainer::ModelTrainer;
use crate::io::{OutcomeSource, load_history};
use crate::models::ModelArtifact;
use crate::prep::clean;

/// Frame the confirmed records as a labelled table. Pending records are skipped.
pub fn confirmed_dataset(outcomes: &[OutcomeRecord]) -> Dataset {
    let (features, labels): (Vec<FeatureRecord>, Vec<bool>) = outcomes
        .iter()
        .filter_map(|r| r.actual_default.map(|y| (r.features.clone(), y)))
        .unzip();
    Dataset::from_records(&features, Some(&labels))
}

/// Retrain from `historical` plus the confirmed subset of `outcomes`.
///
/// With no confirmed records this is exactly `trainer.train(historical)`.
pub fn retrain(
    trainer: &ModelTrainer,
    historical: Dataset,
    outcomes: &[OutcomeRecord],
) -> Result<ModelArtifact, TrainingError> {
    let confirmed = confirmed_dataset(outcomes);
    info!(
        historical = historical.n_rows(),
        confirmed = confirmed.n_rows(),
        pending = outcomes.len() - confirmed.n_rows(),
        "retraining"
    );

    if confirmed.n_rows() == 0 {
        return trainer.train(historical);
    }

    let historical = clean(historical).without(&[ID_COLUMN]);
    ensure_domain_codes::<Sex>(&historical)?;
    ensure_domain_codes::<Education>(&historical)?;
    ensure_domain_codes::<Marriage>(&historical)?;

    let combined = historical.concat(&confirmed)?;
    trainer.train_counting(combined, confirmed.n_rows())
}

/// Historical codes for a categorical domain must be the ones confirmed records
/// are encoded with, otherwise the two halves would disagree on meaning.
fn ensure_domain_codes<D: CategoricalDomain>(historical: &Dataset) -> Result<(), TrainingError> {
    let Some(column) = historical.column(D::COLUMN) else {
        // Missing columns are reported by the concatenation.
        return Ok(());
    };
    let Some(values) = column.as_numeric() else {
        return Err(TrainingError::SchemaMismatch(format!(
            "`{}` is text in the historical data but integer-coded in confirmed outcomes",
            D::COLUMN
        )));
    };

    let codes = D::codes();
    let unknown = values
        .iter()
        .flatten()
        .find(|v| !codes.iter().any(|&c| f64::from(c) == **v));
    match unknown {
        Some(v) => Err(TrainingError::SchemaMismatch(format!(
            "`{}` value {v} in the historical data has no code in {:?}",
            D::COLUMN,
            codes
        ))),
        None => Ok(()),
    }
}

/// Load the history, fetch outcomes from `source`, retrain.
#[derive(Debug, Clone)]
pub struct RetrainingWorkflow<S> {
    trainer: ModelTrainer,
    history_path: PathBuf,
    source: S,
}

impl<S: OutcomeSource> RetrainingWorkflow<S> {
    pub fn new(trainer: ModelTrainer, history_path: impl Into<PathBuf>, source: S) -> Self {
        Self {
            trainer,
            history_path: history_path.into(),
            source,
        }
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    pub fn run(&self) -> Result<ModelArtifact, TrainingError> {
        let historical = load_history(&self.history_path)?;
        let outcomes = self.source.fetch_outcomes()?;
        retrain(&self.trainer, historical, &outcomes)
    }
}
