//! Limited-memory BFGS minimizer.
//!
//! Minimizes a smooth objective given a closure returning `(value, gradient)`.
//!
//! Implementation choices:
//! - Two-loop recursion over the last `memory` curvature pairs, with the usual
//!   `sᵀy / yᵀy` initial Hessian scaling.
//! - Backtracking line search on the Armijo condition. Pairs with non-positive
//!   curvature are skipped so the inverse-Hessian estimate stays positive definite.
//! - Stops when the largest gradient component is below `gtol`, or when the
//!   relative decrease of the objective falls below `ftol`.
//!
//! There is no randomness anywhere: the same inputs always give the same iterates.

use std::collections::VecDeque;

use nalgebra::DVector;

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
const MIN_CURVATURE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct LbfgsOptions {
    pub memory: usize,
    pub max_iter: usize,
    pub gtol: f64,
    pub ftol: f64,
}

impl Default for LbfgsOptions {
    fn default() -> Self {
        Self {
            memory: 10,
            max_iter: 1000,
            gtol: 1e-4,
            ftol: 64.0 * f64::EPSILON,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LbfgsReport {
    pub x: DVector<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

struct Pair {
    s: DVector<f64>,
    y: DVector<f64>,
    rho: f64,
}

/// Minimize `objective` starting from `x0`.
///
/// Returns an error only when the objective produces non-finite values at the
/// starting point. Hitting `max_iter` or a stalled line search is reported through
/// `converged = false`.
pub fn minimize<F>(objective: F, x0: DVector<f64>, opts: &LbfgsOptions) -> Result<LbfgsReport, String>
where
    F: Fn(&DVector<f64>) -> (f64, DVector<f64>),
{
    let mut x = x0;
    let (mut fx, mut g) = objective(&x);
    if !fx.is_finite() || g.iter().any(|v| !v.is_finite()) {
        return Err("objective is not finite at the starting point".to_string());
    }

    let memory = opts.memory.max(1);
    let mut history: VecDeque<Pair> = VecDeque::with_capacity(memory);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_iter {
        if g.amax() <= opts.gtol {
            converged = true;
            break;
        }

        let mut d = -two_loop(&g, &history);
        let mut slope = g.dot(&d);
        if slope >= 0.0 {
            // Not a descent direction: restart from steepest descent.
            history.clear();
            d = -g.clone();
            slope = g.dot(&d);
        }

        let mut step = if history.is_empty() {
            (1.0 / g.norm()).min(1.0)
        } else {
            1.0
        };

        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let x_new = &x + &d * step;
            let (f_new, g_new) = objective(&x_new);
            if f_new.is_finite() && f_new <= fx + ARMIJO_C1 * step * slope {
                accepted = Some((x_new, f_new, g_new));
                break;
            }
            step *= 0.5;
        }

        let Some((x_new, f_new, g_new)) = accepted else {
            break;
        };
        iterations += 1;

        let s = &x_new - &x;
        let y = &g_new - &g;
        let sy = s.dot(&y);
        if sy > MIN_CURVATURE {
            if history.len() == memory {
                history.pop_front();
            }
            history.push_back(Pair { s, y, rho: 1.0 / sy });
        }

        let decrease = (fx - f_new) / fx.abs().max(f_new.abs()).max(1.0);
        x = x_new;
        fx = f_new;
        g = g_new;

        if decrease <= opts.ftol || g.amax() <= opts.gtol {
            converged = true;
            break;
        }
    }

    Ok(LbfgsReport {
        x,
        value: fx,
        iterations,
        converged,
    })
}

/// Approximate `H⁻¹ g` from the stored curvature pairs.
fn two_loop(g: &DVector<f64>, history: &VecDeque<Pair>) -> DVector<f64> {
    let mut q = g.clone();
    let mut alphas = vec![0.0; history.len()];

    for (i, pair) in history.iter().enumerate().rev() {
        let alpha = pair.rho * pair.s.dot(&q);
        q.axpy(-alpha, &pair.y, 1.0);
        alphas[i] = alpha;
    }

    let gamma = history
        .back()
        .map(|p| p.s.dot(&p.y) / p.y.dot(&p.y))
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(1.0);
    let mut r = q * gamma;

    for (i, pair) in history.iter().enumerate() {
        let beta = pair.rho * pair.y.dot(&r);
        r.axpy(alphas[i] - beta, &pair.s, 1.0);
    }

    r
}
