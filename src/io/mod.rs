//! Input/output helpers.
//!
//! - historical CSV ingest + header normalization (`ingest`)
//! - CSV export with source headers (`export`)
//! - model artifact read/write + training lock (`artifact`)
//! - confirmed-outcome feed (`outcomes`)

pub mod artifact;
pub mod export;
pub mod ingest;
pub mod outcomes;

pub use artifact::*;
pub use export::*;
pub use ingest::*;
pub use outcomes::*;
