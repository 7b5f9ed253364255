//! `credit-default` library crate.
//!
//! The binary (`cdp`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the trainer and predictor can be embedded in a service
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod prep;
pub mod report;
pub mod serve;
