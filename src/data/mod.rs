//! Data containers and generators.
//!
//! - `frame`: the typed column table every stage works on
//! - `sample`: seeded synthetic history for demos and tests

pub mod frame;
pub mod sample;

pub use frame::*;
pub use sample::*;
