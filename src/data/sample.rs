//! Synthetic credit-card history.
//!
//! Produces a reproducible dataset shaped like the real one, including its coding
//! quirks (education 0/5/6, marriage 0, repayment status -2, negative bills), so
//! the whole train/retrain/predict loop can run without the source file.
//!
//! Labels come from a latent risk score: delinquent repayment status dominates,
//! with smaller effects from utilization and credit limit.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::data::frame::{Column, Dataset};
use crate::domain::{FEATURE_COLUMNS, ID_COLUMN, LABEL_COLUMN};
use crate::error::TrainingError;
use crate::math::sigmoid;

/// Base log-odds of default for a client with no delinquency.
const BASE_LOG_ODDS: f64 = -1.6;

pub fn generate_history(rows: usize, seed: u64) -> Result<Dataset, TrainingError> {
    if rows == 0 {
        return Err(TrainingError::EmptyDataset);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut table: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows); FEATURE_COLUMNS.len()];
    let mut ids = Vec::with_capacity(rows);
    let mut labels = Vec::with_capacity(rows);

    for i in 0..rows {
        let (values, default) = sample_client(&mut rng);
        for (col, v) in table.iter_mut().zip(values) {
            col.push(Some(v));
        }
        ids.push(Some((i + 1) as f64));
        labels.push(Some(if default { 1.0 } else { 0.0 }));
    }

    let mut columns = vec![Column::numeric(ID_COLUMN, ids)];
    columns.extend(
        FEATURE_COLUMNS
            .iter()
            .zip(table)
            .map(|(name, values)| Column::numeric(*name, values)),
    );
    columns.push(Column::numeric(LABEL_COLUMN, labels));

    Dataset::new(columns).map_err(|message| TrainingError::Malformed { line: 0, message })
}

/// One client in `FEATURE_COLUMNS` order, plus the sampled label.
fn sample_client(rng: &mut StdRng) -> ([f64; 23], bool) {
    let risk: f64 = rng.sample(StandardNormal);

    let limit_bal = f64::from(rng.gen_range(1..=80u32)) * 10_000.0;
    let sex = if rng.gen_bool(0.6) { 2.0 } else { 1.0 };
    let education = pick(rng, &[(1.0, 0.35), (2.0, 0.47), (3.0, 0.16), (4.0, 0.005), (5.0, 0.008), (6.0, 0.002), (0.0, 0.005)]);
    let marriage = pick(rng, &[(1.0, 0.45), (2.0, 0.53), (3.0, 0.01), (0.0, 0.01)]);
    let age_noise: f64 = rng.sample(StandardNormal);
    let age = (35.0 + 9.0 * age_noise).round().clamp(21.0, 75.0);

    let mut out = [0.0; 23];
    out[0] = limit_bal;
    out[1] = sex;
    out[2] = education;
    out[3] = marriage;
    out[4] = age;

    let utilization_noise: f64 = rng.sample(StandardNormal);
    let utilization = (0.3 + 0.25 * risk + 0.15 * utilization_noise).clamp(0.0, 1.1);

    for k in 0..6 {
        let noise: f64 = rng.sample(StandardNormal);
        let u = risk + 0.5 * noise;
        let status = if u < -0.9 {
            -2
        } else if u < -0.3 {
            -1
        } else if u < 1.0 {
            0
        } else {
            (1 + ((u - 1.0) * 2.0) as i32).min(8)
        };

        let bill = if status == -2 {
            0.0
        } else if rng.gen_bool(0.02) {
            // Refunds and overpayments show up as negative statements.
            -f64::from(rng.gen_range(1..2_000u32))
        } else {
            (utilization * limit_bal * rng.gen_range(0.8..1.2)).round()
        };
        let pay = if status > 0 {
            (bill.max(0.0) * 0.02).round()
        } else {
            (bill.max(0.0) * rng.gen_range(0.05..0.5)).round()
        };

        out[5 + k] = f64::from(status);
        out[11 + k] = bill;
        out[17 + k] = pay;
    }

    let recent = out[5].max(0.0);
    let earlier = out[6].max(0.0);
    let logit = BASE_LOG_ODDS + 0.9 * recent + 0.3 * earlier + 0.4 * risk - 0.3 * (limit_bal / 100_000.0 - 2.0);
    let default = rng.gen_bool(sigmoid(logit).clamp(0.0, 1.0));

    (out, default)
}

fn pick(rng: &mut StdRng, weighted: &[(f64, f64)]) -> f64 {
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    let mut u = rng.r#gen::<f64>() * total;
    for &(value, weight) in weighted {
        if u < weight {
            return value;
        }
        u -= weight;
    }
    weighted.last().map(|(v, _)| *v).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BILL_AMOUNT_COLUMNS;
    use crate::prep::clean;

    #[test]
    fn same_seed_same_data() {
        let a = generate_history(200, 7).unwrap();
        let b = generate_history(200, 7).unwrap();
        let c = generate_history(200, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn has_canonical_schema() {
        let ds = generate_history(50, 1).unwrap();
        assert_eq!(ds.n_rows(), 50);
        assert_eq!(ds.n_cols(), FEATURE_COLUMNS.len() + 2);
        assert!(ds.has_column(ID_COLUMN));
        assert!(ds.has_column(LABEL_COLUMN));
    }

    #[test]
    fn contains_source_quirks_and_both_classes() {
        let ds = generate_history(3000, 42).unwrap();
        let any = |ds: &Dataset, col: &str, pred: fn(f64) -> bool| {
            ds.numeric(col).unwrap().iter().flatten().any(|v| pred(*v))
        };

        assert!(any(&ds, "repay_status_1", |v| v == -2.0));
        assert!(any(&ds, "marriage", |v| v == 0.0));
        assert!(any(&ds, "education", |v| v == 0.0 || v == 5.0 || v == 6.0));
        assert!(BILL_AMOUNT_COLUMNS.iter().any(|c| any(&ds, c, |v| v < 0.0)));
        assert!(any(&ds, LABEL_COLUMN, |v| v == 1.0));
        assert!(any(&ds, LABEL_COLUMN, |v| v == 0.0));

        let cleaned = clean(ds);
        assert!(!BILL_AMOUNT_COLUMNS.iter().any(|c| any(&cleaned, c, |v| v < 0.0)));
    }
}
