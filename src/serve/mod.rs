//! Model serving.
//!
//! - `handle`: the shared, swappable reference to the current artifact
//! - `predictor`: single and batch scoring

pub mod handle;
pub mod predictor;

pub use handle::*;
pub use predictor::*;
