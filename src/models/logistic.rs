//! L2-regularized binary logistic regression.
//!
//! Objective (intercept not penalized):
//!
//! ```text
//! minimize (1/n) Σ logloss(y_i, σ(x_iᵀw + b)) + ||w||² / (2·C·n)
//! ```
//!
//! which has the same minimizer as `C·Σ logloss + ½||w||²`. It is solved with the
//! deterministic L-BFGS routine in `math::lbfgs`, starting from zero.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::math::{LbfgsOptions, minimize, sigmoid, softplus};

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticParams {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
}

/// Fitted classifier. Class 0 = no default, class 1 = default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub c: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl LogisticModel {
    /// Fit on a design matrix and 0/1 labels.
    pub fn fit(x: &DMatrix<f64>, y: &[f64], params: &LogisticParams) -> Result<Self, String> {
        let (n, d) = x.shape();
        if n == 0 {
            return Err("no rows to fit".to_string());
        }
        if y.len() != n {
            return Err(format!("{} labels for {n} rows", y.len()));
        }
        if !(params.c.is_finite() && params.c > 0.0) {
            return Err(format!("regularization C must be finite and > 0, got {}", params.c));
        }

        let y = DVector::from_column_slice(y);
        let n_f = n as f64;
        let penalty = 1.0 / (params.c * n_f);

        // theta = [w_0 .. w_{d-1}, b]
        let objective = |theta: &DVector<f64>| {
            let w = theta.rows(0, d);
            let b = theta[d];
            let z = x * w;

            let mut loss = 0.0;
            let mut residual = DVector::<f64>::zeros(n);
            for i in 0..n {
                let zi = z[i] + b;
                loss += softplus(zi) - y[i] * zi;
                residual[i] = sigmoid(zi) - y[i];
            }

            let mut grad = DVector::<f64>::zeros(d + 1);
            let gw = x.tr_mul(&residual) / n_f + w * penalty;
            grad.rows_mut(0, d).copy_from(&gw);
            grad[d] = residual.sum() / n_f;

            let value = loss / n_f + 0.5 * penalty * w.norm_squared();
            (value, grad)
        };

        let opts = LbfgsOptions {
            max_iter: params.max_iter,
            gtol: params.tol,
            ..LbfgsOptions::default()
        };
        let report = minimize(objective, DVector::zeros(d + 1), &opts)?;
        if report.x.iter().any(|v| !v.is_finite()) {
            return Err("solver produced non-finite coefficients".to_string());
        }

        Ok(Self {
            coefficients: report.x.rows(0, d).iter().copied().collect(),
            intercept: report.x[d],
            c: params.c,
            iterations: report.iterations,
            converged: report.converged,
        })
    }

    /// Linear score `xᵀw + b` per row.
    pub fn decision_function(&self, x: &DMatrix<f64>) -> DVector<f64> {
        let w = DVector::from_column_slice(&self.coefficients);
        (x * w).add_scalar(self.intercept)
    }

    /// `[P(no default), P(default)]` per row.
    pub fn predict_proba(&self, x: &DMatrix<f64>) -> Vec<[f64; 2]> {
        self.decision_function(x)
            .iter()
            .map(|&z| {
                let p1 = sigmoid(z);
                [1.0 - p1, p1]
            })
            .collect()
    }
}
