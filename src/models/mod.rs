//! Classifier, the fitted transform + classifier pipeline, and the persisted artifact.

pub mod artifact;
pub mod logistic;
pub mod pipeline;

pub use artifact::*;
pub use logistic::*;
pub use pipeline::*;
