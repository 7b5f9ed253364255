//! Command-line parsing for the credit default predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the data preparation and modeling code.
//!
//! File locations can also come from the environment (or a `.env` file):
//! `CREDIT_DATASET_PATH`, `CREDIT_MODEL_PATH`, `CREDIT_OUTCOMES_PATH`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DEFAULT_CARDINALITY_THRESHOLD;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cdp", version, about = "Credit card default predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train on the historical dataset and publish a new model artifact.
    Train(TrainArgs),
    /// Retrain on the historical dataset plus confirmed outcomes.
    Retrain(RetrainArgs),
    /// Score one or more JSON feature records with the current model.
    Predict(PredictArgs),
    /// Print the training summary of a saved model.
    Inspect(InspectArgs),
    /// Write a synthetic historical dataset (source headers) for demos.
    Synth(SynthArgs),
}

/// Dataset and artifact locations shared by training commands.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Historical dataset CSV.
    #[arg(long = "data", env = "CREDIT_DATASET_PATH", value_name = "CSV")]
    pub data_path: PathBuf,

    /// Model artifact JSON to write.
    #[arg(long = "model", env = "CREDIT_MODEL_PATH", value_name = "JSON", default_value = "model.json")]
    pub model_path: PathBuf,
}

/// Training hyper-parameters.
#[derive(Debug, Args, Clone)]
pub struct TrainingArgs {
    /// Inverse L2 regularization strength.
    #[arg(long, default_value_t = 0.5)]
    pub c: f64,

    /// Maximum solver iterations.
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Gradient tolerance for convergence.
    #[arg(long, default_value_t = 1e-4)]
    pub tol: f64,

    /// Numeric columns with at most this many distinct values are one-hot encoded.
    #[arg(long, default_value_t = DEFAULT_CARDINALITY_THRESHOLD)]
    pub cardinality_threshold: usize,

    /// Show top-N coefficients on each side.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub training: TrainingArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct RetrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Outcome feed: JSON array of stored prediction records.
    #[arg(long = "outcomes", env = "CREDIT_OUTCOMES_PATH", value_name = "JSON")]
    pub outcomes_path: PathBuf,

    #[command(flatten)]
    pub training: TrainingArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Model artifact JSON.
    #[arg(long = "model", env = "CREDIT_MODEL_PATH", value_name = "JSON", default_value = "model.json")]
    pub model_path: PathBuf,

    /// A JSON feature record, or an array of them. Reads stdin when omitted or `-`.
    #[arg(long, value_name = "JSON")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct InspectArgs {
    /// Model artifact JSON.
    #[arg(long = "model", env = "CREDIT_MODEL_PATH", value_name = "JSON", default_value = "model.json")]
    pub model_path: PathBuf,

    /// Show top-N coefficients on each side.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Number of clients to generate.
    #[arg(short = 'n', long, default_value_t = 30_000)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}
