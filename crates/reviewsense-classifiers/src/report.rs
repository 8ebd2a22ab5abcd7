//! Offline evaluation: cross-validation summaries, per-class metrics, and
//! confusion matrices

use crate::codec::LabelCodec;
use reviewsense_core::{Error, Result, Sentiment};
use serde::Serialize;
use std::fmt;

/// Accuracy per fold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationSummary {
    pub scores: Vec<f64>,
}

impl CrossValidationSummary {
    pub fn mean(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    /// Population standard deviation
    pub fn std(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self.scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
            / self.scores.len() as f64;
        var.sqrt()
    }
}

impl fmt::Display for CrossValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scores: Vec<String> = self.scores.iter().map(|s| format!("{:.4}", s)).collect();
        writeln!(
            f,
            "Cross-Validation ({}-folds) - Accuracies: [{}]",
            self.scores.len(),
            scores.join(", ")
        )?;
        writeln!(f, "Average accuracy: {:.4}", self.mean())?;
        write!(f, "Standard deviation of accuracy: {:.4}", self.std())
    }
}

/// Confusion matrix; rows are true classes, columns predicted, both in
/// codec order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub classes: Vec<Sentiment>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_codes(y_true: &[usize], y_pred: &[usize], classes: &[Sentiment]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::internal(format!(
                "{} true labels for {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let k = classes.len();
        let mut counts = vec![vec![0; k]; k];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t >= k || p >= k {
                return Err(Error::internal(format!(
                    "class code out of range for {} classes",
                    k
                )));
            }
            counts[t][p] += 1;
        }

        Ok(Self {
            classes: classes.to_vec(),
            counts,
        })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.classes.len()).map(|i| self.counts[i][i]).sum()
    }

    /// Examples whose true class is `i`
    pub fn support(&self, i: usize) -> usize {
        self.counts[i].iter().sum()
    }

    /// Examples predicted as class `i`
    pub fn predicted(&self, i: usize) -> usize {
        self.counts.iter().map(|row| row[i]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confusion Matrix (rows: true, columns: predicted):")?;
        write!(f, "{:>12}", "")?;
        for class in &self.classes {
            write!(f, "{:>10}", class.as_str())?;
        }
        for (class, row) in self.classes.iter().zip(&self.counts) {
            writeln!(f)?;
            write!(f, "{:>12}", class.as_str())?;
            for count in row {
                write!(f, "{:>10}", count)?;
            }
        }
        Ok(())
    }
}

/// Precision, recall, and F1 of one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: Sentiment,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation of a classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Evaluate predicted class codes against true ones.
    ///
    /// Undefined ratios (no predictions or no support) count as zero.
    pub fn evaluate(y_true: &[usize], y_pred: &[usize], codec: &LabelCodec) -> Result<Self> {
        let confusion = ConfusionMatrix::from_codes(y_true, y_pred, codec.classes())?;
        let total = confusion.total();

        let per_class: Vec<ClassMetrics> = codec
            .classes()
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let tp = confusion.counts[i][i] as f64;
                let precision = ratio(tp, confusion.predicted(i) as f64);
                let recall = ratio(tp, confusion.support(i) as f64);
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support: confusion.support(i),
                }
            })
            .collect();

        let k = per_class.len() as f64;
        let macro_avg = AverageMetrics {
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / k,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / k,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / k,
            support: total,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            ratio(
                per_class
                    .iter()
                    .map(|m| metric(m) * m.support as f64)
                    .sum::<f64>(),
                total as f64,
            )
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Ok(Self {
            accuracy: ratio(confusion.correct() as f64, total as f64),
            per_class,
            macro_avg,
            weighted_avg,
            confusion,
        })
    }
}

fn ratio(num: f64, denom: f64) -> f64 {
    if denom > 0.0 {
        num / denom
    } else {
        0.0
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14}{:>11}{:>11}{:>11}{:>11}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>14}{:>11.2}{:>11.2}{:>11.2}{:>11}",
                m.label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14}{:>11}{:>11}{:>11.2}{:>11}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14}{:>11.2}{:>11.2}{:>11.2}{:>11}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        writeln!(f)?;
        write!(f, "{}", self.confusion)
    }
}
