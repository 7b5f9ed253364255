//! Historical dataset ingest.
//!
//! Turns a credit-card default CSV into a typed `Dataset`:
//!
//! - source headers (`PAY_0`, `BILL_AMT1`, `default.payment.next.month`, ...) are
//!   renamed to canonical names; canonical names pass through unchanged
//! - each column's type is inferred (numeric when every non-missing cell parses)
//! - the canonical feature columns and the label must all be present
//!
//! No cleaning happens here; that is the trainer's first step.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::data::{Column, Dataset};
use crate::domain::{FEATURE_COLUMNS, LABEL_COLUMN};
use crate::error::TrainingError;

/// Source header (lower-cased) -> canonical column name.
pub const SOURCE_COLUMNS: [(&str, &str); 25] = [
    ("id", "id"),
    ("limit_bal", "limit_bal"),
    ("sex", "sex"),
    ("education", "education"),
    ("marriage", "marriage"),
    ("age", "age"),
    ("pay_0", "repay_status_1"),
    ("pay_2", "repay_status_2"),
    ("pay_3", "repay_status_3"),
    ("pay_4", "repay_status_4"),
    ("pay_5", "repay_status_5"),
    ("pay_6", "repay_status_6"),
    ("bill_amt1", "bill_amount_1"),
    ("bill_amt2", "bill_amount_2"),
    ("bill_amt3", "bill_amount_3"),
    ("bill_amt4", "bill_amount_4"),
    ("bill_amt5", "bill_amount_5"),
    ("bill_amt6", "bill_amount_6"),
    ("pay_amt1", "pay_amount_1"),
    ("pay_amt2", "pay_amount_2"),
    ("pay_amt3", "pay_amount_3"),
    ("pay_amt4", "pay_amount_4"),
    ("pay_amt5", "pay_amount_5"),
    ("pay_amt6", "pay_amount_6"),
    ("default.payment.next.month", LABEL_COLUMN),
];

/// Tokens read as a missing cell (compared case-insensitively).
const MISSING_TOKENS: [&str; 4] = ["", "na", "nan", "null"];

/// Load the historical dataset from a CSV file.
pub fn load_history(path: &Path) -> Result<Dataset, TrainingError> {
    let file = File::open(path).map_err(|e| TrainingError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let dataset = read_history(file)?;
    info!(
        path = %path.display(),
        rows = dataset.n_rows(),
        columns = dataset.n_cols(),
        "loaded historical dataset"
    );
    Ok(dataset)
}

/// Parse a historical dataset from any CSV reader.
pub fn read_history<R: Read>(reader: R) -> Result<Dataset, TrainingError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| TrainingError::Malformed {
            line: 1,
            message: format!("unreadable header: {e}"),
        })?
        .clone();
    let names = canonical_headers(&headers)?;

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, plus the header line.
        let line = idx + 2;
        let record = result.map_err(|e| TrainingError::Malformed {
            line: e.position().map(|p| p.line() as usize).unwrap_or(line),
            message: e.to_string(),
        })?;
        for (j, raw) in record.iter().enumerate() {
            cells[j].push(parse_cell(raw));
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();
    for col in &columns {
        debug!(column = %col.name, kind = col.data.kind_name(), "inferred column type");
    }

    let dataset = Dataset::new(columns).map_err(|message| TrainingError::Malformed { line: 1, message })?;
    ensure_required_columns(&dataset)?;
    Ok(dataset)
}

/// Map a header cell to its canonical column name.
pub fn canonical_name(header: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = header.trim().trim_start_matches('\u{feff}').trim().to_ascii_lowercase();
    let name = if name == "default payment next month" {
        "default.payment.next.month".to_string()
    } else {
        name
    };
    SOURCE_COLUMNS
        .iter()
        .find(|(source, canonical)| *source == name || *canonical == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(name)
}

fn canonical_headers(headers: &StringRecord) -> Result<Vec<String>, TrainingError> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let name = canonical_name(header);
        if name.is_empty() {
            return Err(TrainingError::Malformed {
                line: 1,
                message: format!("empty header in column {}", names.len() + 1),
            });
        }
        if names.contains(&name) {
            return Err(TrainingError::Malformed {
                line: 1,
                message: format!("column `{name}` appears more than once"),
            });
        }
        names.push(name);
    }
    Ok(names)
}

fn parse_cell(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if MISSING_TOKENS.iter().any(|t| raw.eq_ignore_ascii_case(t)) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn infer_column(name: String, values: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some),
        })
        .collect();

    match parsed {
        Some(numeric) => Column::numeric(name, numeric),
        None => Column::text(name, values),
    }
}

fn ensure_required_columns(dataset: &Dataset) -> Result<(), TrainingError> {
    let missing: Vec<String> = FEATURE_COLUMNS
        .iter()
        .chain(std::iter::once(&LABEL_COLUMN))
        .filter(|name| !dataset.has_column(name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TrainingError::MissingColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnData;

    const SOURCE_HEADER: &str = "ID,LIMIT_BAL,SEX,EDUCATION,MARRIAGE,AGE,PAY_0,PAY_2,PAY_3,PAY_4,PAY_5,PAY_6,\
BILL_AMT1,BILL_AMT2,BILL_AMT3,BILL_AMT4,BILL_AMT5,BILL_AMT6,\
PAY_AMT1,PAY_AMT2,PAY_AMT3,PAY_AMT4,PAY_AMT5,PAY_AMT6,default.payment.next.month";

    fn csv_with_rows(header: &str, rows: &[&str]) -> String {
        let mut out = header.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn renames_source_headers_and_strips_bom() {
        let text = csv_with_rows(
            &format!("\u{feff}{SOURCE_HEADER}"),
            &["1,20000,2,2,1,24,2,2,-1,-1,-2,-2,3913,3102,689,0,0,0,0,689,0,0,0,0,1"],
        );
        let ds = read_history(text.as_bytes()).unwrap();
        assert_eq!(ds.n_rows(), 1);
        assert_eq!(ds.column_names()[0], "id");
        assert_eq!(ds.numeric("repay_status_1").unwrap(), &[Some(2.0)]);
        assert_eq!(ds.numeric("repay_status_5").unwrap(), &[Some(-2.0)]);
        assert_eq!(ds.numeric("bill_amount_1").unwrap(), &[Some(3913.0)]);
        assert_eq!(ds.numeric(LABEL_COLUMN).unwrap(), &[Some(1.0)]);
    }

    #[test]
    fn canonical_headers_pass_through() {
        assert_eq!(canonical_name("repay_status_3"), "repay_status_3");
        assert_eq!(canonical_name(" Default Payment Next Month "), "default");
        assert_eq!(canonical_name("Region"), "region");
    }

    #[test]
    fn missing_tokens_and_text_columns_are_inferred() {
        let header = format!("{SOURCE_HEADER},region");
        let row_a = "1,20000,2,2,1,24,0,0,0,0,0,0,1,1,1,1,1,1,1,1,1,1,1,1,0,north";
        let row_b = "2,NA,2,2,1,24,0,0,0,0,0,0,1,1,1,1,1,1,1,1,1,1,1,1,1,";
        let ds = read_history(csv_with_rows(&header, &[row_a, row_b]).as_bytes()).unwrap();

        assert_eq!(ds.numeric("limit_bal").unwrap(), &[Some(20000.0), None]);
        match &ds.column("region").unwrap().data {
            ColumnData::Text(v) => assert_eq!(v, &vec![Some("north".to_string()), None]),
            other => panic!("expected text column, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_columns_are_reported() {
        let text = "id,limit_bal,default\n1,1000,0";
        match read_history(text.as_bytes()) {
            Err(TrainingError::MissingColumns(cols)) => {
                assert!(cols.contains(&"sex".to_string()));
                assert!(cols.contains(&"pay_amount_6".to_string()));
                assert!(!cols.contains(&"default".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let text = csv_with_rows(SOURCE_HEADER, &["1,2,3"]);
        assert!(matches!(
            read_history(text.as_bytes()),
            Err(TrainingError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn duplicate_headers_after_renaming_are_rejected() {
        let text = "PAY_0,repay_status_1\n0,0";
        assert!(matches!(read_history(text.as_bytes()), Err(TrainingError::Malformed { line: 1, .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_history(Path::new("/nonexistent/history.csv")).unwrap_err();
        assert!(matches!(err, TrainingError::Io { .. }));
    }
}
