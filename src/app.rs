//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments
//! - runs training / retraining / scoring
//! - prints reports and JSON results

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, InspectArgs, PredictArgs, RetrainArgs, SynthArgs, TrainArgs, TrainingArgs};
use crate::domain::TrainParams;
use crate::error::AppError;

pub mod pipeline;

use pipeline::TrainConfig;

/// Entry point for the `cdp` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; only real variables matter.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Train(args) => handle_train(args),
        Command::Retrain(args) => handle_retrain(args),
        Command::Predict(args) => handle_predict(args),
        Command::Inspect(args) => handle_inspect(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(&args.data, &args.training)?;
    let artifact = pipeline::run_train(&config)?;
    println!("{}", crate::report::format_training_summary(&artifact, args.training.top));
    Ok(())
}

fn handle_retrain(args: RetrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(&args.data, &args.training)?;
    let artifact = pipeline::run_retrain(&config, &args.outcomes_path)?;
    println!("{}", crate::report::format_training_summary(&artifact, args.training.top));
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let (records, single) = pipeline::read_feature_records(args.input.as_deref())?;
    let results = pipeline::run_predict(&args.model_path, &records)?;

    let json = match results.as_slice() {
        [one] if single => serde_json::to_string_pretty(one),
        _ => serde_json::to_string_pretty(&results),
    }
    .map_err(|e| AppError::new(2, format!("Failed to encode predictions: {e}")))?;
    println!("{json}");
    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<(), AppError> {
    let artifact = crate::io::read_artifact(&args.model_path)?;
    println!("{}", crate::report::format_training_summary(&artifact, args.top));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let dataset = crate::data::generate_history(args.rows, args.seed)?;
    crate::io::write_history_csv(&args.out, &dataset)?;
    tracing::info!(path = %args.out.display(), rows = dataset.n_rows(), "wrote synthetic history");
    Ok(())
}

pub fn train_config_from_args(data: &crate::cli::DataArgs, training: &TrainingArgs) -> Result<TrainConfig, AppError> {
    if !(training.c.is_finite() && training.c > 0.0) {
        return Err(AppError::new(2, "`--c` must be a finite number > 0."));
    }
    if !(training.tol.is_finite() && training.tol > 0.0) {
        return Err(AppError::new(2, "`--tol` must be a finite number > 0."));
    }
    if training.max_iter == 0 {
        return Err(AppError::new(2, "`--max-iter` must be > 0."));
    }

    Ok(TrainConfig {
        data_path: data.data_path.clone(),
        model_path: data.model_path.clone(),
        params: TrainParams {
            c: training.c,
            max_iter: training.max_iter,
            tol: training.tol,
            cardinality_threshold: training.cardinality_threshold,
        },
    })
}
