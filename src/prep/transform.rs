//! Imputation, scaling and one-hot encoding.
//!
//! `TransformSpec` describes which columns go through which branch. Fitting it on
//! the training split produces a `FittedTransform` that only stores statistics:
//!
//! - numeric branch: median imputation, then standardization
//! - categorical branch: most-frequent imputation, then one-hot encoding
//!
//! The fitted transform is persisted inside the model artifact and only ever
//! *applied* afterwards. Columns not claimed by either branch are dropped.

use std::cmp::Ordering;

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Column, ColumnData, Dataset};
use crate::prep::segregate::FeatureSplit;

/// Scales below this are treated as a constant column (divide by 1 instead).
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("column `{0}` is missing from the input")]
    MissingColumn(String),

    #[error("column `{column}` must be numeric, found {found}")]
    NotNumeric { column: String, found: &'static str },
}

/// One observed category value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Code(f64),
    Label(String),
}

impl Level {
    fn cmp_total(&self, other: &Level) -> Ordering {
        match (self, other) {
            (Level::Code(a), Level::Code(b)) => a.total_cmp(b),
            (Level::Label(a), Level::Label(b)) => a.cmp(b),
            (Level::Code(_), Level::Label(_)) => Ordering::Less,
            (Level::Label(_), Level::Code(_)) => Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStep {
    pub column: String,
    pub median: f64,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStep {
    pub column: String,
    /// Most frequent value; `None` when the column had no observed values.
    pub fill: Option<Level>,
    /// Sorted distinct values; one output indicator per entry.
    pub categories: Vec<Level>,
}

/// Unfitted column transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSpec {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl TransformSpec {
    pub fn new(split: &FeatureSplit) -> Self {
        Self {
            numeric: split.numeric.clone(),
            categorical: split.categorical.clone(),
        }
    }

    /// Learn imputation/scaling/encoding statistics from the training split.
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedTransform, TransformError> {
        let numeric_cols = lookup_all(dataset, &self.numeric)?;
        let categorical_cols = lookup_all(dataset, &self.categorical)?;

        let numeric = numeric_cols
            .par_iter()
            .map(|col| fit_numeric(col))
            .collect::<Result<Vec<_>, _>>()?;
        let categorical = categorical_cols.par_iter().map(|col| fit_categorical(col)).collect();

        Ok(FittedTransform { numeric, categorical })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    pub numeric: Vec<NumericStep>,
    pub categorical: Vec<CategoricalStep>,
}

impl FittedTransform {
    /// Input columns this transform reads, numeric first.
    pub fn input_columns(&self) -> Vec<String> {
        self.numeric
            .iter()
            .map(|s| s.column.clone())
            .chain(self.categorical.iter().map(|s| s.column.clone()))
            .collect()
    }

    /// Width of the transformed feature space.
    pub fn output_width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|s| s.categories.len()).sum::<usize>()
    }

    /// Output feature labels, e.g. `limit_bal` or `education=4`.
    pub fn output_names(&self) -> Vec<String> {
        let mut out: Vec<String> = self.numeric.iter().map(|s| s.column.clone()).collect();
        for step in &self.categorical {
            for level in &step.categories {
                match level {
                    Level::Code(v) => out.push(format!("{}={v}", step.column)),
                    Level::Label(s) => out.push(format!("{}={s}", step.column)),
                }
            }
        }
        out
    }

    /// Apply stored statistics. Never refits.
    pub fn transform(&self, dataset: &Dataset) -> Result<DMatrix<f64>, TransformError> {
        let n = dataset.n_rows();
        let mut out = DMatrix::<f64>::zeros(n, self.output_width());

        for (j, step) in self.numeric.iter().enumerate() {
            let col = lookup(dataset, &step.column)?;
            let values = col.as_numeric().ok_or_else(|| TransformError::NotNumeric {
                column: step.column.clone(),
                found: col.data.kind_name(),
            })?;
            for (i, v) in values.iter().enumerate() {
                let x = v.unwrap_or(step.median);
                out[(i, j)] = (x - step.mean) / step.scale;
            }
        }

        let mut offset = self.numeric.len();
        for step in &self.categorical {
            let col = lookup(dataset, &step.column)?;
            for i in 0..n {
                let level = level_at(&col.data, i).or_else(|| step.fill.clone());
                // Unseen (or unfillable) values leave the whole block at zero.
                if let Some(k) = level.and_then(|l| step.categories.iter().position(|c| *c == l)) {
                    out[(i, offset + k)] = 1.0;
                }
            }
            offset += step.categories.len();
        }

        Ok(out)
    }
}

fn lookup<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column, TransformError> {
    dataset
        .column(name)
        .ok_or_else(|| TransformError::MissingColumn(name.to_string()))
}

fn lookup_all<'a>(dataset: &'a Dataset, names: &[String]) -> Result<Vec<&'a Column>, TransformError> {
    names.iter().map(|name| lookup(dataset, name)).collect()
}

fn fit_numeric(col: &Column) -> Result<NumericStep, TransformError> {
    let values = col.as_numeric().ok_or_else(|| TransformError::NotNumeric {
        column: col.name.clone(),
        found: col.data.kind_name(),
    })?;

    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    let median = median_mut(&mut observed).unwrap_or(0.0);

    let n = values.len().max(1) as f64;
    let imputed = || values.iter().map(|v| v.unwrap_or(median));
    let mean = imputed().sum::<f64>() / n;
    let var = imputed().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std.is_finite() && std >= MIN_SCALE { std } else { 1.0 };

    Ok(NumericStep {
        column: col.name.clone(),
        median,
        mean,
        scale,
    })
}

fn fit_categorical(col: &Column) -> CategoricalStep {
    let mut observed: Vec<Level> = (0..col.data.len()).filter_map(|i| level_at(&col.data, i)).collect();
    observed.sort_by(Level::cmp_total);

    let mut categories: Vec<Level> = Vec::new();
    let mut fill: Option<(Level, usize)> = None;
    let mut i = 0;
    while i < observed.len() {
        let mut j = i + 1;
        while j < observed.len() && observed[j] == observed[i] {
            j += 1;
        }
        let count = j - i;
        // Strictly greater keeps the smallest value on ties.
        if fill.as_ref().is_none_or(|(_, best)| count > *best) {
            fill = Some((observed[i].clone(), count));
        }
        categories.push(observed[i].clone());
        i = j;
    }

    CategoricalStep {
        column: col.name.clone(),
        fill: fill.map(|(level, _)| level),
        categories,
    }
}

fn level_at(data: &ColumnData, row: usize) -> Option<Level> {
    match data {
        // Normalize -0.0 so it matches the 0.0 category.
        ColumnData::Numeric(v) => v.get(row).copied().flatten().map(|x| Level::Code(x + 0.0)),
        ColumnData::Text(v) => v.get(row).cloned().flatten().map(Level::Label),
    }
}

fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> Dataset {
        Dataset::new(vec![
            Column::numeric("amount", vec![Some(1.0), Some(3.0), None, Some(100.0)]),
            Column::numeric("status", vec![Some(2.0), Some(0.0), Some(2.0), None]),
            Column::text("city", vec![Some("b".into()), None, Some("a".into()), Some("b".into())]),
            Column::numeric("ignored", vec![Some(9.0); 4]),
        ])
        .unwrap()
    }

    fn spec() -> TransformSpec {
        TransformSpec {
            numeric: vec!["amount".into()],
            categorical: vec!["city".into(), "status".into()],
        }
    }

    #[test]
    fn numeric_branch_imputes_median_then_standardizes() {
        let fitted = spec().fit(&train()).unwrap();
        let step = &fitted.numeric[0];
        assert_eq!(step.median, 3.0);
        // Imputed column: [1, 3, 3, 100]
        assert!((step.mean - 26.75).abs() < 1e-12);

        let x = fitted.transform(&train()).unwrap();
        let col: Vec<f64> = (0..4).map(|i| x[(i, 0)]).collect();
        let mean = col.iter().sum::<f64>() / 4.0;
        let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn categorical_branch_imputes_mode_and_one_hot_encodes() {
        let fitted = spec().fit(&train()).unwrap();
        assert_eq!(fitted.output_width(), 1 + 2 + 2);
        assert_eq!(
            fitted.output_names(),
            vec!["amount", "city=a", "city=b", "status=0", "status=2"]
        );

        let x = fitted.transform(&train()).unwrap();
        // Row 1 has no city: filled with the mode "b".
        assert_eq!((x[(1, 1)], x[(1, 2)]), (0.0, 1.0));
        // Row 3 has no status: filled with the mode 2.
        assert_eq!((x[(3, 3)], x[(3, 4)]), (0.0, 1.0));
    }

    #[test]
    fn mode_ties_resolve_to_smallest_value() {
        let ds = Dataset::new(vec![Column::numeric("s", vec![Some(3.0), Some(1.0), Some(3.0), Some(1.0), None])]).unwrap();
        let spec = TransformSpec {
            numeric: vec![],
            categorical: vec!["s".into()],
        };
        let fitted = spec.fit(&ds).unwrap();
        assert_eq!(fitted.categorical[0].fill, Some(Level::Code(1.0)));
    }

    #[test]
    fn unseen_category_encodes_as_all_zeros() {
        let fitted = spec().fit(&train()).unwrap();
        let probe = Dataset::new(vec![
            Column::numeric("amount", vec![Some(2.0)]),
            Column::numeric("status", vec![Some(7.0)]),
            Column::text("city", vec![Some("zzz".into())]),
        ])
        .unwrap();
        let x = fitted.transform(&probe).unwrap();
        assert_eq!(x.ncols(), 5);
        for j in 1..5 {
            assert_eq!(x[(0, j)], 0.0);
        }
    }

    #[test]
    fn transform_does_not_refit_on_new_data() {
        let fitted = spec().fit(&train()).unwrap();
        let probe = Dataset::new(vec![
            Column::numeric("amount", vec![Some(1000.0), Some(2000.0)]),
            Column::numeric("status", vec![Some(0.0), Some(0.0)]),
            Column::text("city", vec![Some("a".into()), Some("a".into())]),
        ])
        .unwrap();
        let x = fitted.transform(&probe).unwrap();
        let step = &fitted.numeric[0];
        assert_eq!(x[(0, 0)], (1000.0 - step.mean) / step.scale);
    }

    #[test]
    fn missing_claimed_column_is_an_error() {
        let fitted = spec().fit(&train()).unwrap();
        let probe = Dataset::new(vec![Column::numeric("amount", vec![Some(1.0)])]).unwrap();
        assert!(matches!(
            fitted.transform(&probe),
            Err(TransformError::MissingColumn(c)) if c == "city"
        ));
    }

    #[test]
    fn constant_column_scales_by_one() {
        let ds = Dataset::new(vec![Column::numeric("k", vec![Some(5.0); 3])]).unwrap();
        let spec = TransformSpec {
            numeric: vec!["k".into()],
            categorical: vec![],
        };
        let fitted = spec.fit(&ds).unwrap();
        assert_eq!(fitted.numeric[0].scale, 1.0);
        let x = fitted.transform(&ds).unwrap();
        assert!(x.iter().all(|v| *v == 0.0));
    }
}
