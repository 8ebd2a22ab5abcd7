//! Limited-memory BFGS minimizer for smooth convex objectives

use std::collections::VecDeque;
use tracing::trace;

/// Sufficient-decrease constant of the backtracking line search
const ARMIJO_C1: f64 = 1e-4;

/// Maximum step halvings before the line search gives up
const MAX_BACKTRACKS: usize = 50;

/// Relative objective reduction below which the run counts as converged
const FTOL: f64 = 2.2e-9;

/// A differentiable objective
pub trait Objective {
    /// Number of parameters
    fn dim(&self) -> usize;

    /// Objective value at `x`; writes the gradient into `grad`
    fn evaluate(&self, x: &[f64], grad: &mut [f64]) -> f64;
}

/// Result of a minimization run
#[derive(Debug, Clone)]
pub struct OptimizerOutcome {
    /// Best iterate found
    pub x: Vec<f64>,

    /// Objective value at `x`
    pub value: f64,

    /// Accepted steps
    pub iterations: usize,

    /// Whether a stopping tolerance was met within the iteration budget
    pub converged: bool,

    /// Largest absolute gradient component at `x`
    pub gradient_norm: f64,
}

/// L-BFGS settings
#[derive(Debug, Clone, Copy)]
pub struct Lbfgs {
    pub max_iter: usize,
    pub tolerance: f64,
    pub history_size: usize,
}

impl Default for Lbfgs {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-4,
            history_size: 10,
        }
    }
}

struct Correction {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

impl Lbfgs {
    /// Minimize `objective` starting from `x0`.
    ///
    /// Every accepted step decreases the objective, so the returned iterate
    /// is the best one seen even when the budget runs out.
    pub fn minimize<O: Objective>(&self, objective: &O, x0: Vec<f64>) -> OptimizerOutcome {
        let n = objective.dim();
        let mut x = x0;
        let mut grad = vec![0.0; n];
        let mut value = objective.evaluate(&x, &mut grad);

        let mut history: VecDeque<Correction> = VecDeque::with_capacity(self.history_size);
        let mut iterations = 0;
        let mut converged = false;

        let mut x_next = vec![0.0; n];
        let mut grad_next = vec![0.0; n];

        while iterations < self.max_iter {
            if inf_norm(&grad) <= self.tolerance {
                converged = true;
                break;
            }

            let mut direction = two_loop(&grad, &history);
            let mut slope = dot(&grad, &direction);
            if slope >= 0.0 {
                // Curvature pairs went stale; restart from steepest descent.
                history.clear();
                direction = grad.iter().map(|g| -g).collect();
                slope = -dot(&grad, &grad);
            }

            let mut step = if history.is_empty() {
                1.0 / l2_norm(&grad).max(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                for i in 0..n {
                    x_next[i] = x[i] + step * direction[i];
                }
                let candidate = objective.evaluate(&x_next, &mut grad_next);
                if candidate.is_finite() && candidate <= value + ARMIJO_C1 * step * slope {
                    accepted = Some(candidate);
                    break;
                }
                step *= 0.5;
            }

            let Some(next_value) = accepted else {
                trace!("Line search failed after {} iterations", iterations);
                break;
            };
            iterations += 1;

            let s: Vec<f64> = x_next.iter().zip(&x).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = grad_next.iter().zip(&grad).map(|(a, b)| a - b).collect();
            let sy = dot(&s, &y);
            if sy > f64::EPSILON * dot(&y, &y) {
                if history.len() == self.history_size {
                    history.pop_front();
                }
                history.push_back(Correction { s, y, rho: 1.0 / sy });
            }

            let reduction = value - next_value;
            std::mem::swap(&mut x, &mut x_next);
            std::mem::swap(&mut grad, &mut grad_next);
            value = next_value;

            if reduction <= FTOL * value.abs().max(1.0) {
                converged = true;
                break;
            }
        }

        if !converged && inf_norm(&grad) <= self.tolerance {
            converged = true;
        }

        OptimizerOutcome {
            gradient_norm: inf_norm(&grad),
            x,
            value,
            iterations,
            converged,
        }
    }
}

/// Two-loop recursion: returns `-H * grad` for the implicit inverse Hessian
fn two_loop(grad: &[f64], history: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = grad.to_vec();
    let mut alphas = Vec::with_capacity(history.len());

    for c in history.iter().rev() {
        let alpha = c.rho * dot(&c.s, &q);
        axpy(-alpha, &c.y, &mut q);
        alphas.push(alpha);
    }

    if let Some(last) = history.back() {
        let gamma = dot(&last.s, &last.y) / dot(&last.y, &last.y);
        for v in q.iter_mut() {
            *v *= gamma;
        }
    }

    for (c, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = c.rho * dot(&c.y, &q);
        axpy(alpha - beta, &c.s, &mut q);
    }

    for v in q.iter_mut() {
        *v = -*v;
    }
    q
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(x) = sum_i (i + 1) * (x_i - i)^2
    struct Quadratic(usize);

    impl Objective for Quadratic {
        fn dim(&self) -> usize {
            self.0
        }

        fn evaluate(&self, x: &[f64], grad: &mut [f64]) -> f64 {
            let mut f = 0.0;
            for i in 0..self.0 {
                let w = (i + 1) as f64;
                let d = x[i] - i as f64;
                f += w * d * d;
                grad[i] = 2.0 * w * d;
            }
            f
        }
    }

    struct Rosenbrock;

    impl Objective for Rosenbrock {
        fn dim(&self) -> usize {
            2
        }

        fn evaluate(&self, x: &[f64], grad: &mut [f64]) -> f64 {
            let (a, b) = (x[0], x[1]);
            grad[0] = -2.0 * (1.0 - a) - 400.0 * a * (b - a * a);
            grad[1] = 200.0 * (b - a * a);
            (1.0 - a).powi(2) + 100.0 * (b - a * a).powi(2)
        }
    }

    #[test]
    fn test_quadratic_minimum() {
        let outcome = Lbfgs::default().minimize(&Quadratic(5), vec![0.0; 5]);

        assert!(outcome.converged);
        for (i, x) in outcome.x.iter().enumerate() {
            assert!((x - i as f64).abs() < 1e-3, "x[{}] = {}", i, x);
        }
    }

    #[test]
    fn test_rosenbrock() {
        let lbfgs = Lbfgs {
            tolerance: 1e-8,
            ..Default::default()
        };
        let outcome = lbfgs.minimize(&Rosenbrock, vec![-1.2, 1.0]);

        assert!((outcome.x[0] - 1.0).abs() < 1e-3);
        assert!((outcome.x[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_budget_exhaustion_keeps_best_iterate() {
        let lbfgs = Lbfgs {
            max_iter: 2,
            tolerance: 1e-12,
            ..Default::default()
        };
        let mut grad = vec![0.0; 2];
        let start = Rosenbrock.evaluate(&[-1.2, 1.0], &mut grad);
        let outcome = lbfgs.minimize(&Rosenbrock, vec![-1.2, 1.0]);

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 2);
        assert!(outcome.value < start);
    }

    #[test]
    fn test_already_optimal_start() {
        let outcome = Lbfgs::default().minimize(&Quadratic(3), vec![0.0, 1.0, 2.0]);
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
    }
}
