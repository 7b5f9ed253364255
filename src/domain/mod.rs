//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - categorical code tables (`Sex`, `Education`, `Marriage`)
//! - request/response records (`FeatureRecord`, `PredictionResult`, `OutcomeRecord`)
//! - canonical column names and training parameters

pub mod types;

pub use types::*;
