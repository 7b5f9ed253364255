//! Shared workflow logic behind the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core flows:
//! history CSV -> trainer -> artifact, history + outcome feed -> retrain, and
//! artifact -> predictor -> results.
//!
//! The command handlers in `app` then only deal with presentation.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::{FeatureRecord, PredictionResult, TrainParams};
use crate::error::AppError;
use crate::fit::{ModelTrainer, RetrainingWorkflow};
use crate::io::{JsonOutcomeFeed, load_history};
use crate::models::ModelArtifact;
use crate::serve::{ModelHandle, Predictor};

/// Resolved inputs for a training run.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub params: TrainParams,
}

impl TrainConfig {
    fn trainer(&self) -> ModelTrainer {
        ModelTrainer::new(&self.model_path, self.params.clone())
    }
}

pub fn run_train(config: &TrainConfig) -> Result<ModelArtifact, AppError> {
    let historical = load_history(&config.data_path)?;
    Ok(config.trainer().train(historical)?)
}

pub fn run_retrain(config: &TrainConfig, outcomes_path: &Path) -> Result<ModelArtifact, AppError> {
    let workflow = RetrainingWorkflow::new(config.trainer(), &config.data_path, JsonOutcomeFeed::new(outcomes_path));
    Ok(workflow.run()?)
}

/// Prediction input: a single record or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictInput {
    One(FeatureRecord),
    Many(Vec<FeatureRecord>),
}

/// Parsed and validated records plus whether the input was a single object.
pub fn read_feature_records(input: Option<&Path>) -> Result<(Vec<FeatureRecord>, bool), AppError> {
    let reader: Box<dyn Read> = match input {
        None => Box::new(std::io::stdin().lock()),
        Some(path) if path.as_os_str() == "-" => Box::new(std::io::stdin().lock()),
        Some(path) => Box::new(File::open(path).map_err(|e| {
            AppError::new(2, format!("Failed to open input '{}': {e}", path.display()))
        })?),
    };

    let parsed: PredictInput = serde_json::from_reader(BufReader::new(reader))
        .map_err(|e| AppError::new(2, format!("Invalid feature record JSON: {e}")))?;
    let (records, single) = match parsed {
        PredictInput::One(record) => (vec![record], true),
        PredictInput::Many(records) => (records, false),
    };

    for (idx, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|e| AppError::new(2, format!("Invalid feature record #{idx}: {e}")))?;
    }
    Ok((records, single))
}

pub fn run_predict(model_path: &Path, records: &[FeatureRecord]) -> Result<Vec<PredictionResult>, AppError> {
    let predictor = Predictor::new(Arc::new(ModelHandle::open(model_path)?));
    Ok(predictor.predict_batch(records)?)
}
