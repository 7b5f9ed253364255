//! Training workflows.
//!
//! - `trainer`: clean -> segregate -> fit pipeline -> persist -> publish
//! - `retrain`: merge confirmed outcomes into the history and train again

pub mod retrain;
pub mod trainer;

pub use retrain::*;
pub use trainer::*;
