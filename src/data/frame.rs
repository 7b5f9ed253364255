//! In-memory column table.
//!
//! Every column declares its type up front: numeric cells are `Option<f64>`,
//! text cells are `Option<String>`. `None` is a missing cell. Integer-coded
//! categorical fields are stored as numeric columns, exactly as they arrive in the
//! raw data; the segregator decides later which of them are really categorical.

use crate::domain::{FEATURE_COLUMNS, FeatureRecord, LABEL_COLUMN};
use crate::error::TrainingError;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Text(_) => "text",
        }
    }

    fn extend_from(&mut self, other: &ColumnData) -> bool {
        match (self, other) {
            (ColumnData::Numeric(a), ColumnData::Numeric(b)) => {
                a.extend_from_slice(b);
                true
            }
            (ColumnData::Text(a), ColumnData::Text(b)) => {
                a.extend_from_slice(b);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a table; all columns must have the same length and distinct names.
    pub fn new(columns: Vec<Column>) -> Result<Self, String> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.data.len() != n_rows {
                return Err(format!(
                    "Column `{}` has {} rows, expected {n_rows}.",
                    col.name,
                    col.data.len()
                ));
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(format!("Duplicate column `{}`.", col.name));
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// Frame records as a table with canonical codes, optionally with a label column.
    pub fn from_records(records: &[FeatureRecord], labels: Option<&[bool]>) -> Self {
        let rows: Vec<[f64; 23]> = records.iter().map(FeatureRecord::feature_values).collect();
        let mut columns: Vec<Column> = FEATURE_COLUMNS
            .iter()
            .enumerate()
            .map(|(j, name)| Column::numeric(*name, rows.iter().map(|r| Some(r[j])).collect()))
            .collect();

        if let Some(labels) = labels {
            columns.push(Column::numeric(
                LABEL_COLUMN,
                labels.iter().map(|&y| Some(if y { 1.0 } else { 0.0 })).collect(),
            ));
        }

        Self {
            columns,
            n_rows: records.len(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column(name).and_then(Column::as_numeric)
    }

    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        let col = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.n_rows = 0;
        }
        Some(col)
    }

    /// Project onto `names`, in that order. Every name must exist.
    pub fn select(&self, names: &[String]) -> Result<Dataset, String> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .cloned()
                    .ok_or_else(|| format!("column `{name}` is missing"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dataset {
            n_rows: if columns.is_empty() { 0 } else { self.n_rows },
            columns,
        })
    }

    /// Drop the named columns if present.
    pub fn without(mut self, names: &[&str]) -> Self {
        for name in names {
            self.drop_column(name);
        }
        self
    }

    /// Append `other`'s rows below this table.
    ///
    /// The column sets must match exactly (names and declared types). Column order
    /// may differ; the result keeps this table's order.
    pub fn concat(&self, other: &Dataset) -> Result<Dataset, TrainingError> {
        let missing: Vec<&str> = self
            .column_names()
            .into_iter()
            .filter(|name| !other.has_column(name))
            .collect();
        let extra: Vec<&str> = other
            .column_names()
            .into_iter()
            .filter(|name| !self.has_column(name))
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(TrainingError::SchemaMismatch(format!(
                "columns only in first: [{}]; columns only in second: [{}]",
                missing.join(", "),
                extra.join(", ")
            )));
        }

        let mut columns = self.columns.clone();
        for col in &mut columns {
            let Some(rhs) = other.column(&col.name) else {
                continue;
            };
            if !col.data.extend_from(&rhs.data) {
                return Err(TrainingError::SchemaMismatch(format!(
                    "column `{}` is {} in first but {} in second",
                    col.name,
                    col.data.kind_name(),
                    rhs.data.kind_name()
                )));
            }
        }

        Ok(Dataset {
            columns,
            n_rows: self.n_rows + other.n_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dataset {
        Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0), None]),
            Column::text("b", vec![Some("x".into()), Some("y".into())]),
        ])
        .unwrap()
    }

    #[test]
    fn new_rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(1.0), Some(2.0)]),
        ])
        .unwrap_err();
        assert!(err.contains("`b`"));
    }

    #[test]
    fn concat_aligns_columns_by_name() {
        let lhs = small();
        let rhs = Dataset::new(vec![
            Column::text("b", vec![Some("z".into())]),
            Column::numeric("a", vec![Some(3.0)]),
        ])
        .unwrap();

        let out = lhs.concat(&rhs).unwrap();
        assert_eq!(out.n_rows(), 3);
        assert_eq!(out.column_names(), vec!["a", "b"]);
        assert_eq!(out.numeric("a").unwrap(), &[Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn concat_rejects_different_column_sets() {
        let lhs = small();
        let rhs = Dataset::new(vec![Column::numeric("a", vec![Some(3.0)])]).unwrap();
        assert!(matches!(lhs.concat(&rhs), Err(TrainingError::SchemaMismatch(_))));
    }

    #[test]
    fn concat_rejects_type_changes() {
        let lhs = small();
        let rhs = Dataset::new(vec![
            Column::numeric("a", vec![Some(3.0)]),
            Column::numeric("b", vec![Some(1.0)]),
        ])
        .unwrap();
        let err = lhs.concat(&rhs).unwrap_err();
        assert!(err.to_string().contains("`b` is text"));
    }

    #[test]
    fn select_reorders_and_requires_columns() {
        let ds = small();
        let out = ds.select(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(out.column_names(), vec!["b", "a"]);
        assert!(ds.select(&["c".to_string()]).is_err());
    }

    #[test]
    fn from_records_adds_label_column() {
        let record = FeatureRecord {
            limit_bal: 1000,
            sex: crate::domain::Sex::Male,
            education: crate::domain::Education::University,
            marriage: crate::domain::Marriage::Single,
            age: 25,
            repay_status: [0; 6],
            bill_amount: [0.0; 6],
            pay_amount: [0.0; 6],
        };
        let ds = Dataset::from_records(&[record.clone(), record], Some(&[true, false]));
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.n_cols(), FEATURE_COLUMNS.len() + 1);
        assert_eq!(ds.numeric(LABEL_COLUMN).unwrap(), &[Some(1.0), Some(0.0)]);
        assert_eq!(ds.numeric("education").unwrap(), &[Some(2.0), Some(2.0)]);
    }
}
