//! Scoring requests against the served model.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{FeatureRecord, PredictionResult};
use crate::error::{ModelUnavailableError, PredictError};
use crate::models::ModelArtifact;
use crate::serve::handle::ModelHandle;

#[derive(Debug, Clone)]
pub struct Predictor {
    handle: Arc<ModelHandle>,
}

impl Predictor {
    pub fn new(handle: Arc<ModelHandle>) -> Self {
        Self { handle }
    }

    /// Load the artifact at `path` up front; fails if there is none.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ModelUnavailableError> {
        Ok(Self::new(Arc::new(ModelHandle::open(path)?)))
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictError> {
        let artifact = self.snapshot()?;
        let result = artifact.score(record)?;
        debug!(
            version = artifact.version,
            default = result.default,
            confidence = result.confidence,
            "scored record"
        );
        Ok(result)
    }

    /// Score many records against one model snapshot.
    pub fn predict_batch(&self, records: &[FeatureRecord]) -> Result<Vec<PredictionResult>, PredictError> {
        let artifact = self.snapshot()?;
        records.par_iter().map(|r| artifact.score(r)).collect()
    }

    /// Current model, loading it from disk on first use.
    fn snapshot(&self) -> Result<Arc<ModelArtifact>, PredictError> {
        Ok(self.handle.get_or_load()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_history;
    use crate::domain::{Education, Marriage, Sex, TrainParams};
    use crate::fit::ModelTrainer;
    use tempfile::TempDir;

    fn record(repay: i32) -> FeatureRecord {
        FeatureRecord {
            limit_bal: 200_000,
            sex: Sex::Female,
            education: Education::University,
            marriage: Marriage::Single,
            age: 35,
            repay_status: [repay; 6],
            bill_amount: [20_000.0; 6],
            pay_amount: [2_000.0; 6],
        }
    }

    fn trained(dir: &TempDir) -> Predictor {
        let handle = Arc::new(ModelHandle::new(dir.path().join("model.json")));
        ModelTrainer::new(handle.path(), TrainParams::default())
            .with_handle(Arc::clone(&handle))
            .train(generate_history(1500, 11).unwrap())
            .unwrap();
        Predictor::new(handle)
    }

    #[test]
    fn unloaded_handle_is_unavailable() {
        let predictor = Predictor::new(Arc::new(ModelHandle::new("/nonexistent/model.json")));
        assert!(matches!(predictor.predict(&record(0)), Err(PredictError::Unavailable(_))));
    }

    #[test]
    fn lazy_handle_loads_artifact_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        ModelTrainer::new(&path, TrainParams::default())
            .train(generate_history(400, 12).unwrap())
            .unwrap();

        let handle = Arc::new(ModelHandle::new(&path));
        assert!(handle.current().is_none());
        let predictor = Predictor::new(Arc::clone(&handle));
        assert!(predictor.predict(&record(0)).is_ok());
        assert!(handle.current().is_some());
    }

    #[test]
    fn lazy_handle_without_artifact_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let predictor = Predictor::new(Arc::new(ModelHandle::new(dir.path().join("model.json"))));
        match predictor.predict_batch(&[record(0)]) {
            Err(PredictError::Unavailable(e)) => assert!(e.reason.contains("no artifact")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn open_fails_without_artifact() {
        let dir = TempDir::new().unwrap();
        assert!(Predictor::open(dir.path().join("model.json")).is_err());
    }

    #[test]
    fn confidence_is_a_probability_of_the_chosen_class() {
        let dir = TempDir::new().unwrap();
        let predictor = trained(&dir);
        for repay in [-1, 0, 2, 4] {
            let r = predictor.predict(&record(repay)).unwrap();
            assert!((0.5..=1.0).contains(&r.confidence));
        }
    }

    #[test]
    fn delinquency_raises_default_risk() {
        let dir = TempDir::new().unwrap();
        let predictor = trained(&dir);
        let current = predictor.predict(&record(0)).unwrap();
        let late = predictor.predict(&record(3)).unwrap();
        assert!(!current.default);
        assert!(late.default);
    }

    #[test]
    fn batch_matches_single() {
        let dir = TempDir::new().unwrap();
        let predictor = trained(&dir);
        let records: Vec<FeatureRecord> = (-1..5).map(record).collect();
        let batch = predictor.predict_batch(&records).unwrap();
        for (r, b) in records.iter().zip(&batch) {
            assert_eq!(predictor.predict(r).unwrap(), *b);
        }
    }
}
