//! Write a dataset back out as CSV with source headers.
//!
//! The output is readable by `load_history`, so synthetic data can stand in for
//! the real historical file.

use std::path::Path;

use crate::data::{ColumnData, Dataset};
use crate::error::TrainingError;
use crate::io::ingest::SOURCE_COLUMNS;

/// Source header for a canonical column (upper-case, like the original dataset).
pub fn source_header(canonical: &str) -> String {
    match SOURCE_COLUMNS.iter().find(|(_, c)| *c == canonical) {
        Some((source, _)) if source.contains('.') => source.to_string(),
        Some((source, _)) => source.to_ascii_uppercase(),
        None => canonical.to_string(),
    }
}

pub fn write_history_csv(path: &Path, dataset: &Dataset) -> Result<(), TrainingError> {
    let io_err = |message: String| TrainingError::Io {
        path: path.to_path_buf(),
        message,
    };

    let mut writer = csv::Writer::from_path(path).map_err(|e| io_err(e.to_string()))?;
    writer
        .write_record(dataset.column_names().into_iter().map(source_header))
        .map_err(|e| io_err(e.to_string()))?;

    for row in 0..dataset.n_rows() {
        let cells = dataset.columns().iter().map(|col| match &col.data {
            ColumnData::Numeric(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            ColumnData::Text(v) => v[row].clone().unwrap_or_default(),
        });
        writer.write_record(cells).map_err(|e| io_err(e.to_string()))?;
    }
    writer.flush().map_err(|e| io_err(e.to_string()))?;
    Ok(())
}
