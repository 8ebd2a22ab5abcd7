//! One-vs-rest logistic regression over sparse features
//!
//! Each class gets an independent binary model trained against all other
//! classes. The per-class objective is
//! `0.5 * ||w||^2 + C * sum_i s_i * log(1 + exp(-y_i * (w.x_i + b)))`
//! with `y_i` in {-1, +1}, sample weights `s_i`, and an unpenalised
//! intercept. Prediction picks the class with the largest decision value.

use crate::optimizer::{Lbfgs, Objective};
use crate::vectorizer::SparseVector;
use reviewsense_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Classifier training settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularization strength
    #[serde(default = "default_c")]
    pub c: f64,

    /// Iteration budget per binary problem
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Gradient tolerance
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// L-BFGS memory
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Weight classes inversely to their frequency
    #[serde(default = "default_true")]
    pub balanced_class_weight: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: default_c(),
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
            history_size: default_history_size(),
            balanced_class_weight: true,
        }
    }
}

impl LogisticConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Error::config("c must be a positive number"));
        }
        if self.max_iter == 0 {
            return Err(Error::config("max_iter must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::config("tolerance must be a positive number"));
        }
        if self.history_size == 0 {
            return Err(Error::config("history_size must be at least 1"));
        }
        Ok(())
    }

    fn optimizer(&self) -> Lbfgs {
        Lbfgs {
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            history_size: self.history_size,
        }
    }
}

fn default_c() -> f64 {
    1.0
}

fn default_max_iter() -> usize {
    1000
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_history_size() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Fitted one-vs-rest model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneVsRestLogistic {
    n_features: usize,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl OneVsRestLogistic {
    /// Input dimensionality
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of output classes
    pub fn n_classes(&self) -> usize {
        self.intercepts.len()
    }

    pub fn coefficients(&self) -> &[Vec<f64>] {
        &self.coefficients
    }

    pub fn intercepts(&self) -> &[f64] {
        &self.intercepts
    }

    /// Check that the coefficient shapes agree with each other
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.intercepts.is_empty() {
            return Err("model has no classes".to_string());
        }
        if self.coefficients.len() != self.intercepts.len() {
            return Err(format!(
                "{} coefficient rows for {} intercepts",
                self.coefficients.len(),
                self.intercepts.len()
            ));
        }
        if let Some(row) = self.coefficients.iter().find(|r| r.len() != self.n_features) {
            return Err(format!(
                "coefficient row of length {} for {} features",
                row.len(),
                self.n_features
            ));
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("model contains non-finite parameters".to_string());
        }
        Ok(())
    }

    /// Per-class decision values
    pub fn decision_function(&self, x: &SparseVector) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| x.dot(w) + b)
            .collect()
    }

    /// Class code with the largest decision value; ties go to the lower code
    pub fn predict_one(&self, x: &SparseVector) -> usize {
        argmax(&self.decision_function(x))
    }

    pub fn predict(&self, features: &[SparseVector]) -> Vec<usize> {
        features.iter().map(|x| self.predict_one(x)).collect()
    }

    /// Normalised per-class sigmoid scores
    pub fn predict_proba(&self, x: &SparseVector) -> Vec<f64> {
        let raw: Vec<f64> = self.decision_function(x).into_iter().map(sigmoid).collect();
        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            raw.into_iter().map(|p| p / total).collect()
        } else {
            vec![1.0 / raw.len() as f64; raw.len()]
        }
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Convergence details of one binary problem
#[derive(Debug, Clone)]
pub struct ClassFit {
    pub class: usize,
    pub iterations: usize,
    pub converged: bool,
    pub loss: f64,
}

/// A fitted model plus per-class optimizer diagnostics
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub model: OneVsRestLogistic,
    pub class_fits: Vec<ClassFit>,
}

impl FitOutcome {
    pub fn unconverged(&self) -> impl Iterator<Item = &ClassFit> {
        self.class_fits.iter().filter(|f| !f.converged)
    }
}

/// Trains [`OneVsRestLogistic`] models
#[derive(Debug, Clone, Default)]
pub struct LogisticTrainer {
    config: LogisticConfig,
}

impl LogisticTrainer {
    pub fn new(config: LogisticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    /// Fit one binary model per class code in `0..n_classes`.
    ///
    /// Running out of iterations is not an error: the best iterate is kept
    /// and the class is reported as unconverged in the outcome.
    pub fn fit(
        &self,
        features: &[SparseVector],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<FitOutcome> {
        self.config.validate()?;

        if features.is_empty() {
            return Err(Error::training("no training examples"));
        }
        if features.len() != labels.len() {
            return Err(Error::training(format!(
                "{} feature vectors for {} labels",
                features.len(),
                labels.len()
            )));
        }
        if n_classes < 2 {
            return Err(Error::training("at least two classes are required"));
        }
        if let Some(bad) = labels.iter().find(|&&y| y >= n_classes) {
            return Err(Error::training(format!(
                "class code {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let n_features = features[0].dim();
        if features.iter().any(|x| x.dim() != n_features) {
            return Err(Error::training("feature vectors differ in dimensionality"));
        }

        let sample_weights = self.sample_weights(labels, n_classes);
        let optimizer = self.config.optimizer();

        let mut coefficients = Vec::with_capacity(n_classes);
        let mut intercepts = Vec::with_capacity(n_classes);
        let mut class_fits = Vec::with_capacity(n_classes);

        for class in 0..n_classes {
            let objective = BinaryLogistic {
                features,
                targets: labels
                    .iter()
                    .map(|&y| if y == class { 1.0 } else { -1.0 })
                    .collect(),
                weights: &sample_weights,
                c: self.config.c,
                n_features,
            };

            let outcome = optimizer.minimize(&objective, vec![0.0; n_features + 1]);
            debug!(
                "Class {}: loss {:.6} after {} iterations (converged: {})",
                class, outcome.value, outcome.iterations, outcome.converged
            );

            let mut params = outcome.x;
            let intercept = params.pop().unwrap_or(0.0);
            coefficients.push(params);
            intercepts.push(intercept);
            class_fits.push(ClassFit {
                class,
                iterations: outcome.iterations,
                converged: outcome.converged,
                loss: outcome.value,
            });
        }

        info!(
            "Fitted {} one-vs-rest models on {} examples x {} features",
            n_classes,
            features.len(),
            n_features
        );

        Ok(FitOutcome {
            model: OneVsRestLogistic {
                n_features,
                coefficients,
                intercepts,
            },
            class_fits,
        })
    }

    /// `n / (k * count_c)` per sample when balancing, else 1
    fn sample_weights(&self, labels: &[usize], n_classes: usize) -> Vec<f64> {
        if !self.config.balanced_class_weight {
            return vec![1.0; labels.len()];
        }

        let mut counts = vec![0usize; n_classes];
        for &y in labels {
            counts[y] += 1;
        }
        let present = counts.iter().filter(|&&c| c > 0).count() as f64;
        let n = labels.len() as f64;

        labels
            .iter()
            .map(|&y| n / (present * counts[y] as f64))
            .collect()
    }
}

struct BinaryLogistic<'a> {
    features: &'a [SparseVector],
    targets: Vec<f64>,
    weights: &'a [f64],
    c: f64,
    n_features: usize,
}

impl Objective for BinaryLogistic<'_> {
    fn dim(&self) -> usize {
        self.n_features + 1
    }

    fn evaluate(&self, params: &[f64], grad: &mut [f64]) -> f64 {
        let (w, b) = params.split_at(self.n_features);
        let b = b[0];

        let mut value = 0.5 * w.iter().map(|v| v * v).sum::<f64>();
        grad[..self.n_features].copy_from_slice(w);
        grad[self.n_features] = 0.0;

        for ((x, &y), &s) in self.features.iter().zip(&self.targets).zip(self.weights) {
            let margin = y * (x.dot(w) + b);
            value += self.c * s * softplus(-margin);

            let coef = -self.c * s * y * sigmoid(-margin);
            for (j, v) in x.iter() {
                grad[j] += coef * v;
            }
            grad[self.n_features] += coef;
        }

        value
    }
}

/// `ln(1 + e^t)` without overflow
fn softplus(t: f64) -> f64 {
    if t > 0.0 {
        t + (-t).exp().ln_1p()
    } else {
        t.exp().ln_1p()
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(dim: usize, index: usize) -> SparseVector {
        SparseVector::from_pairs(dim, vec![(index, 1.0)])
    }

    fn toy_data() -> (Vec<SparseVector>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for class in 0..3 {
            for _ in 0..5 {
                features.push(one_hot(3, class));
                labels.push(class);
            }
        }
        (features, labels)
    }

    #[test]
    fn test_sigmoid_and_softplus() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(100.0) > 0.99);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((softplus(0.0) - 2f64.ln()).abs() < 1e-12);
        assert!((softplus(800.0) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_separates_classes() {
        let (features, labels) = toy_data();
        let outcome = LogisticTrainer::default().fit(&features, &labels, 3).unwrap();

        assert_eq!(outcome.model.predict(&features), labels);
        assert_eq!(outcome.unconverged().count(), 0);
        assert!(outcome.model.validate().is_ok());
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let (features, labels) = toy_data();
        let weights = vec![1.3; labels.len()];
        let objective = BinaryLogistic {
            features: &features,
            targets: labels.iter().map(|&y| if y == 1 { 1.0 } else { -1.0 }).collect(),
            weights: &weights,
            c: 0.7,
            n_features: 3,
        };

        let params = vec![0.2, -0.4, 0.1, 0.3];
        let mut grad = vec![0.0; 4];
        objective.evaluate(&params, &mut grad);

        let h = 1e-6;
        let mut scratch = vec![0.0; 4];
        for i in 0..4 {
            let mut up = params.clone();
            let mut down = params.clone();
            up[i] += h;
            down[i] -= h;
            let numeric = (objective.evaluate(&up, &mut scratch)
                - objective.evaluate(&down, &mut scratch))
                / (2.0 * h);
            assert!((numeric - grad[i]).abs() < 1e-5, "param {}", i);
        }
    }

    #[test]
    fn test_balanced_weights() {
        let trainer = LogisticTrainer::default();
        let weights = trainer.sample_weights(&[0, 0, 0, 1], 3);

        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[3] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_predicts_from_intercepts() {
        let (features, labels) = toy_data();
        let model = LogisticTrainer::default()
            .fit(&features, &labels, 3)
            .unwrap()
            .model;

        let code = model.predict_one(&SparseVector::zeros(3));
        assert!(code < 3);
        let proba = model.predict_proba(&SparseVector::zeros(3));
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_exhausted_budget_is_reported_not_fatal() {
        let (features, labels) = toy_data();
        let trainer = LogisticTrainer::new(LogisticConfig {
            max_iter: 1,
            tolerance: 1e-12,
            ..Default::default()
        });

        let outcome = trainer.fit(&features, &labels, 3).unwrap();
        assert_eq!(outcome.unconverged().count(), 3);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let (features, labels) = toy_data();
        let trainer = LogisticTrainer::default();

        assert!(trainer.fit(&[], &[], 3).is_err());
        assert!(trainer.fit(&features, &labels[1..], 3).is_err());
        assert!(trainer.fit(&features, &labels, 2).is_err());
        assert!(trainer.fit(&features, &vec![0; labels.len()], 1).is_err());
    }

    #[test]
    fn test_model_validation_catches_shape_mismatch() {
        let model = OneVsRestLogistic {
            n_features: 2,
            coefficients: vec![vec![0.0, 1.0], vec![1.0]],
            intercepts: vec![0.0, 0.0],
        };
        assert!(model.validate().is_err());
    }
}
