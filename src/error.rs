//! Error types.
//!
//! Library components return typed errors (`TrainingError`, `ModelUnavailableError`,
//! `PredictError`). The binary collapses them into `AppError`, which carries the
//! process exit code:
//!
//! - 2: input / configuration / I/O
//! - 3: data or schema problems
//! - 4: fitting failures
//! - 5: no usable model artifact

use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A training or retraining run failed. The previously published artifact is untouched.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Failed to read '{path}': {message}")]
    Io { path: PathBuf, message: String },

    #[error("Malformed dataset at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Dataset has no `{0}` label column.")]
    MissingLabel(String),

    #[error("Dataset has zero rows after cleaning.")]
    EmptyDataset,

    #[error("Invalid label at row {row}: {message}")]
    InvalidLabel { row: usize, message: String },

    #[error("Labels contain a single class ({0}); need both outcomes to fit.")]
    SingleClass(u8),

    #[error("Schema mismatch between historical and confirmed-outcome data: {0}")]
    SchemaMismatch(String),

    #[error("Preprocessing failed: {0}")]
    Transform(String),

    #[error("Solver failed: {0}")]
    Solver(String),

    #[error("Another training run holds the lock '{}'.", .0.display())]
    InProgress(PathBuf),

    #[error("Failed to persist model artifact '{path}': {message}")]
    Persist { path: PathBuf, message: String },
}

impl From<TrainingError> for AppError {
    fn from(err: TrainingError) -> Self {
        let code = match &err {
            TrainingError::Io { .. } | TrainingError::Persist { .. } | TrainingError::InProgress(_) => 2,
            TrainingError::Malformed { .. }
            | TrainingError::MissingColumns(_)
            | TrainingError::MissingLabel(_)
            | TrainingError::EmptyDataset
            | TrainingError::InvalidLabel { .. }
            | TrainingError::SingleClass(_)
            | TrainingError::SchemaMismatch(_) => 3,
            TrainingError::Transform(_) | TrainingError::Solver(_) => 4,
        };
        AppError::new(code, err.to_string())
    }
}

/// No model artifact is available to score with.
#[derive(Debug, Error)]
#[error("Model unavailable ({}): {reason}", .path.display())]
pub struct ModelUnavailableError {
    pub path: PathBuf,
    pub reason: String,
}

impl From<ModelUnavailableError> for AppError {
    fn from(err: ModelUnavailableError) -> Self {
        AppError::new(5, err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Unavailable(#[from] ModelUnavailableError),

    #[error("Scoring failed: {0}")]
    Scoring(String),
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Unavailable(e) => e.into(),
            PredictError::Scoring(msg) => AppError::new(4, format!("Scoring failed: {msg}")),
        }
    }
}
