//! Raw-value normalization.
//!
//! The source data carries a few undocumented codes and artifacts. These rules
//! fold them into documented values:
//!
//! - education 0, 5, 6 -> 4 ("others")
//! - marriage 0 -> 3 ("others")
//! - repayment status -2 -> -1 (both mean "no revolving balance used")
//! - negative bill amounts -> 0
//!
//! Every rule maps its output into a fixed point, so cleaning is idempotent.

use crate::data::{ColumnData, Dataset};
use crate::domain::{BILL_AMOUNT_COLUMNS, CategoricalDomain, Education, Marriage, REPAY_STATUS_PREFIX};

const EDUCATION_UNKNOWN_CODES: [f64; 3] = [0.0, 5.0, 6.0];
const MARRIAGE_UNKNOWN_CODES: [f64; 1] = [0.0];
const REPAY_NO_BALANCE: f64 = -2.0;
const REPAY_PAID_DULY: f64 = -1.0;

/// Apply the cleaning rules. Absent or text-typed columns are left untouched.
pub fn clean(mut dataset: Dataset) -> Dataset {
    let education_others = f64::from(Education::Others.code());
    let marriage_others = f64::from(Marriage::Others.code());

    for col in dataset.columns_mut() {
        let ColumnData::Numeric(values) = &mut col.data else {
            continue;
        };

        if col.name == Education::COLUMN {
            replace_codes(values, &EDUCATION_UNKNOWN_CODES, education_others);
        } else if col.name == Marriage::COLUMN {
            replace_codes(values, &MARRIAGE_UNKNOWN_CODES, marriage_others);
        } else if col.name.starts_with(REPAY_STATUS_PREFIX) {
            replace_codes(values, &[REPAY_NO_BALANCE], REPAY_PAID_DULY);
        } else if BILL_AMOUNT_COLUMNS.contains(&col.name.as_str()) {
            for v in values.iter_mut().flatten() {
                *v = v.max(0.0);
            }
        }
    }

    dataset
}

fn replace_codes(values: &mut [Option<f64>], from: &[f64], to: f64) {
    for v in values.iter_mut().flatten() {
        if from.contains(v) {
            *v = to;
        }
    }
}
