//! Reporting utilities: coefficient rankings and formatted terminal output.

pub mod format;

pub use format::*;

use crate::models::ModelArtifact;

/// Largest (positive) and smallest (negative) coefficients, top-N each side.
#[derive(Debug, Clone)]
pub struct WeightRankings {
    pub riskier: Vec<(String, f64)>,
    pub safer: Vec<(String, f64)>,
}

pub fn rank_weights(artifact: &ModelArtifact, top_n: usize) -> WeightRankings {
    let mut sorted = artifact.pipeline.weights();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let riskier = sorted.iter().filter(|(_, w)| *w > 0.0).take(top_n).cloned().collect();
    let safer = sorted.iter().rev().filter(|(_, w)| *w < 0.0).take(top_n).cloned().collect();

    WeightRankings { riskier, safer }
}
