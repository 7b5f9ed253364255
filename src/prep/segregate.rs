//! Numeric vs categorical column split.
//!
//! The raw schema stores every categorical field as an integer code. Treating
//! those codes as magnitudes would distort scaling for a linear model, so any
//! numeric column with few distinct values is re-classified as categorical.
//!
//! The cardinality cut-off is a heuristic: a genuinely continuous column that
//! happens to have few distinct values in a given dataset will be one-hot encoded.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{ColumnData, Dataset};

/// Column partition consumed by the preprocessing transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSplit {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl FeatureSplit {
    /// All claimed columns: numeric first, then categorical.
    pub fn all_columns(&self) -> Vec<String> {
        self.numeric.iter().chain(self.categorical.iter()).cloned().collect()
    }
}

/// Partition the table's columns. Text columns come first among the categorical
/// ones, followed by low-cardinality numeric columns; both keep table order.
pub fn segregate(dataset: &Dataset, threshold: usize) -> FeatureSplit {
    let cardinalities: Vec<Option<usize>> = dataset
        .columns()
        .par_iter()
        .map(|col| match &col.data {
            ColumnData::Numeric(values) => Some(distinct_count(values)),
            ColumnData::Text(_) => None,
        })
        .collect();

    let mut numeric = Vec::new();
    let mut text = Vec::new();
    let mut low_cardinality = Vec::new();

    for (col, card) in dataset.columns().iter().zip(cardinalities) {
        match card {
            None => text.push(col.name.clone()),
            Some(n) if n <= threshold => low_cardinality.push(col.name.clone()),
            Some(_) => numeric.push(col.name.clone()),
        }
    }

    text.extend(low_cardinality);
    FeatureSplit {
        numeric,
        categorical: text,
    }
}

/// Distinct observed values; missing cells are not counted.
fn distinct_count(values: &[Option<f64>]) -> usize {
    values
        .iter()
        .flatten()
        // -0.0 and 0.0 are the same category.
        .map(|v| (v + 0.0).to_bits())
        .collect::<HashSet<u64>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    #[test]
    fn low_cardinality_numeric_becomes_categorical() {
        let ds = Dataset::new(vec![
            Column::numeric("limit_bal", (0..20).map(|i| Some(1000.0 * i as f64)).collect()),
            Column::numeric("sex", (0..20).map(|i| Some((i % 2 + 1) as f64)).collect()),
            Column::text("region", (0..20).map(|i| Some(format!("r{}", i % 3))).collect()),
            Column::numeric("repay_status_1", (0..20).map(|i| Some((i % 11) as f64 - 1.0)).collect()),
        ])
        .unwrap();

        let split = segregate(&ds, 12);
        assert_eq!(split.numeric, vec!["limit_bal"]);
        assert_eq!(split.categorical, vec!["region", "sex", "repay_status_1"]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let twelve = Dataset::new(vec![Column::numeric(
            "x",
            (0..24).map(|i| Some((i % 12) as f64)).collect(),
        )])
        .unwrap();
        assert_eq!(segregate(&twelve, 12).categorical, vec!["x"]);

        let thirteen = Dataset::new(vec![Column::numeric(
            "x",
            (0..26).map(|i| Some((i % 13) as f64)).collect(),
        )])
        .unwrap();
        assert_eq!(segregate(&thirteen, 12).numeric, vec!["x"]);
    }

    #[test]
    fn missing_cells_do_not_count_as_a_value() {
        let mut values: Vec<Option<f64>> = (0..12).map(|i| Some(i as f64)).collect();
        values.push(None);
        let ds = Dataset::new(vec![Column::numeric("x", values)]).unwrap();
        assert_eq!(segregate(&ds, 12).categorical, vec!["x"]);
    }
}
