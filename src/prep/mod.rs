//! Data preparation ahead of the classifier.
//!
//! - `clean`: fold anomalous raw codes
//! - `segregate`: decide numeric vs categorical columns
//! - `transform`: imputation + scaling + one-hot encoding

pub mod clean;
pub mod segregate;
pub mod transform;

pub use clean::*;
pub use segregate::*;
pub use transform::*;
