//! Preprocessing transform + classifier, fitted and stored as one unit.
//!
//! Splitting the two would risk train/serve skew (different imputation or
//! scaling statistics), so the only way to get a classifier is `CreditPipeline::fit`,
//! which fits the transform on the training split and the classifier on its output.

use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::domain::TrainParams;
use crate::error::TrainingError;
use crate::models::logistic::{LogisticModel, LogisticParams};
use crate::prep::{FeatureSplit, FittedTransform, TransformError, TransformSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditPipeline {
    pub transform: FittedTransform,
    pub classifier: LogisticModel,
}

impl CreditPipeline {
    /// Jointly fit the transform and the classifier on the training split.
    pub fn fit(
        split: &FeatureSplit,
        features: &Dataset,
        labels: &[f64],
        params: &TrainParams,
    ) -> Result<Self, TrainingError> {
        let transform = TransformSpec::new(split)
            .fit(features)
            .map_err(|e| TrainingError::Transform(e.to_string()))?;
        let x = transform
            .transform(features)
            .map_err(|e| TrainingError::Transform(e.to_string()))?;

        let classifier = LogisticModel::fit(
            &x,
            labels,
            &LogisticParams {
                c: params.c,
                max_iter: params.max_iter,
                tol: params.tol,
            },
        )
        .map_err(TrainingError::Solver)?;

        Ok(Self { transform, classifier })
    }

    /// `[P(no default), P(default)]` per row.
    pub fn predict_proba(&self, features: &Dataset) -> Result<Vec<[f64; 2]>, TransformError> {
        let x = self.transform.transform(features)?;
        Ok(self.classifier.predict_proba(&x))
    }

    /// Output feature labels paired with their coefficients.
    pub fn weights(&self) -> Vec<(String, f64)> {
        self.transform
            .output_names()
            .into_iter()
            .zip(self.classifier.coefficients.iter().copied())
            .collect()
    }
}
