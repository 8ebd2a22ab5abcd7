//! End-to-end training: corpus -> split -> features -> cross-validation ->
//! final fit -> held-out report -> artifact set

use crate::artifacts::ArtifactSet;
use crate::codec::LabelCodec;
use crate::config::TrainingConfig;
use crate::corpus::{assemble_corpus, class_counts};
use crate::logistic::{FitOutcome, LogisticTrainer};
use crate::report::{ClassificationReport, CrossValidationSummary};
use crate::vectorizer::{SparseVector, TfidfVectorizer};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reviewsense_core::{Error, LabeledExample, Result, Sentiment};
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

/// Non-fatal conditions observed while training
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingWarning {
    /// A binary model ran out of iterations; its best iterate was kept
    NonConvergence {
        class: Sentiment,
        iterations: usize,
        /// Cross-validation fold, or `None` for the final model
        fold: Option<usize>,
    },
}

impl fmt::Display for TrainingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonConvergence {
                class,
                iterations,
                fold,
            } => {
                write!(
                    f,
                    "optimizer did not converge for class {} within {} iterations",
                    class, iterations
                )?;
                if let Some(fold) = fold {
                    write!(f, " (fold {})", fold + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Fitted, mutually consistent artifacts
    pub artifacts: ArtifactSet,

    /// Accuracy of each cross-validation fold
    pub cross_validation: CrossValidationSummary,

    /// Metrics on the held-out split
    pub report: ClassificationReport,

    pub warnings: Vec<TrainingWarning>,

    /// Examples after corpus assembly
    pub corpus_size: usize,

    pub train_size: usize,

    pub test_size: usize,

    /// Examples per label after corpus assembly
    pub class_counts: Vec<(Sentiment, usize)>,
}

/// Stratified train/test split.
///
/// Each class is shuffled with a generator seeded from `seed` and
/// `round(count * test_size)` of its examples are held out, always leaving
/// at least one for training. Returned indices are sorted.
pub fn stratified_split(
    labels: &[usize],
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(Error::config(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in distinct(labels) {
        let mut members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        members.shuffle(&mut rng);

        let n_test = ((members.len() as f64 * test_size).round() as usize)
            .min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Stratified k-fold assignment.
///
/// Examples are dealt round-robin to folds class by class, so every fold
/// gets a near-equal share of every class and fold sizes differ by at most
/// one. Returns the validation indices of each fold.
pub fn stratified_folds(labels: &[usize], k: usize) -> Result<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(Error::config(format!("folds must be at least 2, got {}", k)));
    }
    if labels.len() < k {
        return Err(Error::training(format!(
            "cannot split {} examples into {} folds",
            labels.len(),
            k
        )));
    }

    let mut folds = vec![Vec::new(); k];
    let mut next = 0;
    for class in distinct(labels) {
        for i in (0..labels.len()).filter(|&i| labels[i] == class) {
            folds[next % k].push(i);
            next += 1;
        }
    }

    for fold in folds.iter_mut() {
        fold.sort_unstable();
    }
    Ok(folds)
}

fn distinct(labels: &[usize]) -> Vec<usize> {
    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Result of one cross-validation fold
struct FoldResult {
    accuracy: f64,
    fit: FitOutcome,
}

/// k-fold cross-validation with a fresh model per fold
pub struct CrossValidator<'a> {
    trainer: &'a LogisticTrainer,
    k: usize,
    parallel: bool,
}

impl<'a> CrossValidator<'a> {
    pub fn new(trainer: &'a LogisticTrainer, k: usize) -> Self {
        Self {
            trainer,
            k,
            parallel: false,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Accuracy of each fold
    pub fn cross_validate(
        &self,
        features: &[SparseVector],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<CrossValidationSummary> {
        let (summary, _) = self.run(features, labels, n_classes)?;
        Ok(summary)
    }

    fn run(
        &self,
        features: &[SparseVector],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<(CrossValidationSummary, Vec<FitOutcome>)> {
        let folds = stratified_folds(labels, self.k)?;

        let results: Vec<Result<FoldResult>> = if self.parallel {
            std::thread::scope(|scope| {
                let handles: Vec<_> = folds
                    .iter()
                    .map(|held_out| {
                        scope.spawn(move || self.fold(features, labels, n_classes, held_out))
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|h| {
                        h.join()
                            .unwrap_or_else(|_| Err(Error::internal("cross-validation fold panicked")))
                    })
                    .collect()
            })
        } else {
            folds
                .iter()
                .map(|held_out| self.fold(features, labels, n_classes, held_out))
                .collect()
        };

        let mut scores = Vec::with_capacity(self.k);
        let mut fits = Vec::with_capacity(self.k);
        for (i, result) in results.into_iter().enumerate() {
            let fold = result?;
            info!("Fold {}/{}: accuracy {:.4}", i + 1, self.k, fold.accuracy);
            scores.push(fold.accuracy);
            fits.push(fold.fit);
        }

        Ok((CrossValidationSummary { scores }, fits))
    }

    fn fold(
        &self,
        features: &[SparseVector],
        labels: &[usize],
        n_classes: usize,
        held_out: &[usize],
    ) -> Result<FoldResult> {
        let mut is_held_out = vec![false; labels.len()];
        for &i in held_out {
            is_held_out[i] = true;
        }

        let (train_x, train_y): (Vec<SparseVector>, Vec<usize>) = (0..labels.len())
            .filter(|&i| !is_held_out[i])
            .map(|i| (features[i].clone(), labels[i]))
            .unzip();

        let fit = self.trainer.fit(&train_x, &train_y, n_classes)?;
        let correct = held_out
            .iter()
            .filter(|&&i| fit.model.predict_one(&features[i]) == labels[i])
            .count();

        Ok(FoldResult {
            accuracy: correct as f64 / held_out.len() as f64,
            fit,
        })
    }
}

/// One-shot batch training job
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on rating-derived examples.
    ///
    /// The fixed neutral examples are appended first when configured. The
    /// vectorizer is fitted on the training split only; the held-out split
    /// is used solely for the final report.
    pub fn run(&self, examples: Vec<LabeledExample>) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let started = Instant::now();

        let corpus = if self.config.include_neutral_examples {
            assemble_corpus(examples)
        } else {
            examples
        };
        let counts = class_counts(&corpus);
        info!("Training corpus: {} examples {:?}", corpus.len(), counts);

        let labels: Vec<Sentiment> = corpus.iter().map(|e| e.label).collect();
        let codec = LabelCodec::fit(&labels)?;
        if codec.n_classes() < 2 {
            return Err(Error::training(format!(
                "corpus has a single class {:?}",
                codec.classes()
            )));
        }
        let codes = codec.encode_all(&labels)?;

        let eval = &self.config.evaluation;
        let (train_idx, test_idx) = stratified_split(&codes, eval.test_size, eval.seed)?;
        info!(
            "Split: {} training / {} held-out examples",
            train_idx.len(),
            test_idx.len()
        );

        let train_text: Vec<&str> = train_idx.iter().map(|&i| corpus[i].text.as_str()).collect();
        let test_text: Vec<&str> = test_idx.iter().map(|&i| corpus[i].text.as_str()).collect();
        let train_y: Vec<usize> = train_idx.iter().map(|&i| codes[i]).collect();
        let test_y: Vec<usize> = test_idx.iter().map(|&i| codes[i]).collect();

        let mut vectorizer = TfidfVectorizer::new(self.config.vectorizer.clone());
        let train_x = vectorizer.fit_transform(&train_text)?;
        let test_x = vectorizer.transform_many(&test_text);

        let trainer = LogisticTrainer::new(self.config.classifier.clone());
        let mut warnings = Vec::new();

        let (cross_validation, fold_fits) = CrossValidator::new(&trainer, eval.folds)
            .parallel(eval.parallel_folds)
            .run(&train_x, &train_y, codec.n_classes())?;
        info!(
            "Cross-validation accuracy: {:.4} (+/- {:.4})",
            cross_validation.mean(),
            cross_validation.std()
        );
        for (fold, fit) in fold_fits.iter().enumerate() {
            collect_warnings(fit, &codec, Some(fold), &mut warnings)?;
        }

        let final_fit = trainer.fit(&train_x, &train_y, codec.n_classes())?;
        collect_warnings(&final_fit, &codec, None, &mut warnings)?;

        let predicted = final_fit.model.predict(&test_x);
        let report = ClassificationReport::evaluate(&test_y, &predicted, &codec)?;
        info!("Held-out accuracy: {:.4}", report.accuracy);

        let artifacts = ArtifactSet::new(vectorizer, final_fit.model, codec)?;
        info!("Training finished in {:.2?}", started.elapsed());

        Ok(TrainingOutcome {
            artifacts,
            cross_validation,
            report,
            warnings,
            corpus_size: corpus.len(),
            train_size: train_idx.len(),
            test_size: test_idx.len(),
            class_counts: counts,
        })
    }
}

fn collect_warnings(
    fit: &FitOutcome,
    codec: &LabelCodec,
    fold: Option<usize>,
    warnings: &mut Vec<TrainingWarning>,
) -> Result<()> {
    for class_fit in fit.unconverged() {
        let warning = TrainingWarning::NonConvergence {
            class: codec.decode(class_fit.class)?,
            iterations: class_fit.iterations,
            fold,
        };
        warn!("{}", warning);
        warnings.push(warning);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_stratified_and_reproducible() {
        let labels: Vec<usize> = (0..100).map(|i| if i < 80 { 0 } else { 1 }).collect();

        let (train, test) = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 4);

        let again = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!((train.clone(), test.clone()), again);

        let other_seed = stratified_split(&labels, 0.2, 7).unwrap();
        assert_ne!(test, other_seed.1);
    }

    #[test]
    fn test_split_keeps_singletons_in_training() {
        let (train, test) = stratified_split(&[0, 0, 0, 0, 0, 1], 0.2, 42).unwrap();
        assert!(train.contains(&5));
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn test_folds_partition_and_balance() {
        let labels: Vec<usize> = (0..23).map(|i| i % 3).collect();
        let folds = stratified_folds(&labels, 5).unwrap();

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..23).collect::<Vec<_>>());

        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn test_folds_reject_too_few_examples() {
        assert!(stratified_folds(&[0, 1, 0], 5).is_err());
        assert!(stratified_folds(&[0, 1, 0], 1).is_err());
    }

    #[test]
    fn test_parallel_and_sequential_cv_agree() {
        let features: Vec<SparseVector> = (0..20)
            .map(|i| SparseVector::from_pairs(2, vec![(i % 2, 1.0)]))
            .collect();
        let labels: Vec<usize> = (0..20).map(|i| i % 2).collect();
        let trainer = LogisticTrainer::default();

        let sequential = CrossValidator::new(&trainer, 5)
            .cross_validate(&features, &labels, 2)
            .unwrap();
        let parallel = CrossValidator::new(&trainer, 5)
            .parallel(true)
            .cross_validate(&features, &labels, 2)
            .unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(sequential.scores, vec![1.0; 5]);
    }

    #[test]
    fn test_single_class_corpus_rejected() {
        let pipeline = TrainingPipeline::new(TrainingConfig {
            include_neutral_examples: false,
            ..Default::default()
        });
        let examples = (0..10)
            .map(|i| LabeledExample::new(format!("good thing {}", i), Sentiment::Positive))
            .collect();

        assert!(matches!(pipeline.run(examples), Err(Error::Training(_))));
    }

    #[test]
    fn test_non_convergence_is_a_warning() {
        let mut config = TrainingConfig::default();
        config.classifier.max_iter = 1;
        config.classifier.tolerance = 1e-12;
        config.evaluation.parallel_folds = false;

        let examples: Vec<LabeledExample> = (0..20)
            .flat_map(|_| {
                [
                    LabeledExample::new("really good", Sentiment::Positive),
                    LabeledExample::new("really bad", Sentiment::Negative),
                ]
            })
            .collect();

        let outcome = TrainingPipeline::new(config).run(examples).unwrap();
        assert!(!outcome.warnings.is_empty());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, TrainingWarning::NonConvergence { fold: None, .. })));
    }
}
