//! TF-IDF feature extraction
//!
//! Text is lower-cased and split into word tokens of at least two
//! characters. Every run of `n` consecutive tokens for `n` in the
//! configured n-gram range becomes a term. Fitting keeps at most
//! `max_features` terms, ranked by corpus-wide count weighted by smooth
//! inverse document frequency, and freezes their column indices in sorted
//! term order. Transforming emits raw term counts scaled by IDF and
//! L2-normalised; terms outside the frozen vocabulary contribute nothing.

use reviewsense_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, info};

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"))
}

/// Feature extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfConfig {
    /// Upper bound on vocabulary size (feature dimensionality)
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Smallest and largest n-gram length, inclusive
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    /// Lower-case text before tokenizing
    #[serde(default = "default_true")]
    pub lowercase: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_features: default_max_features(),
            ngram_range: default_ngram_range(),
            lowercase: true,
        }
    }
}

impl TfidfConfig {
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if self.max_features == 0 {
            return Err(Error::config("max_features must be at least 1"));
        }
        if min_n == 0 || min_n > max_n {
            return Err(Error::config(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        Ok(())
    }
}

fn default_max_features() -> usize {
    5000
}

fn default_ngram_range() -> (usize, usize) {
    (1, 3)
}

fn default_true() -> bool {
    true
}

/// Sparse feature vector with a fixed dimensionality
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// All-zero vector
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs; indices must be unique and `< dim`
    pub fn from_pairs(dim: usize, pairs: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let sorted: BTreeMap<usize, f64> = pairs
            .into_iter()
            .filter(|(i, v)| *i < dim && *v != 0.0)
            .collect();
        let (indices, values) = sorted.into_iter().unzip();
        Self {
            dim,
            indices,
            values,
        }
    }

    /// Declared dimensionality
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of non-zero coordinates
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over non-zero `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product against a dense weight slice of at least `dim` entries
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter().map(|(i, v)| v * dense[i]).sum()
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

/// Fitted (or unfitted) TF-IDF vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VectorizerState", into = "VectorizerState")]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
    vocabulary: HashMap<String, usize>,
}

/// Persisted form of a vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerState {
    config: TfidfConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl From<TfidfVectorizer> for VectorizerState {
    fn from(v: TfidfVectorizer) -> Self {
        Self {
            config: v.config,
            terms: v.terms,
            idf: v.idf,
        }
    }
}

impl TryFrom<VectorizerState> for TfidfVectorizer {
    type Error = String;

    fn try_from(state: VectorizerState) -> std::result::Result<Self, String> {
        state.config.validate().map_err(|e| e.to_string())?;
        if state.terms.len() != state.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but {} idf weights",
                state.terms.len(),
                state.idf.len()
            ));
        }
        if state.terms.len() > state.config.max_features {
            return Err(format!(
                "vocabulary of {} terms exceeds max_features {}",
                state.terms.len(),
                state.config.max_features
            ));
        }
        if state.idf.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err("idf weights must be finite and positive".to_string());
        }

        let vocabulary: HashMap<String, usize> = state
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        if vocabulary.len() != state.terms.len() {
            return Err("vocabulary contains duplicate terms".to_string());
        }

        Ok(Self {
            config: state.config,
            terms: state.terms,
            idf: state.idf,
            vocabulary,
        })
    }
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer
    pub fn new(config: TfidfConfig) -> Self {
        Self {
            config,
            terms: Vec::new(),
            idf: Vec::new(),
            vocabulary: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TfidfConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.terms.is_empty()
    }

    /// Number of terms in the frozen vocabulary (feature dimensionality)
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Terms in column order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Column index of a term, if it is in the vocabulary
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// IDF weight of a column
    pub fn idf(&self, index: usize) -> Option<f64> {
        self.idf.get(index).copied()
    }

    /// SHA-256 over the settings, the vocabulary in column order, and the
    /// IDF weights, hex encoded.
    ///
    /// Two fits agree only if they would produce identical feature vectors.
    pub fn fingerprint(&self) -> String {
        let (min_n, max_n) = self.config.ngram_range;
        let mut hasher = Sha256::new();
        hasher.update((self.config.max_features as u64).to_le_bytes());
        hasher.update((min_n as u64).to_le_bytes());
        hasher.update((max_n as u64).to_le_bytes());
        hasher.update([self.config.lowercase as u8]);
        for (term, idf) in self.terms.iter().zip(&self.idf) {
            hasher.update(term.as_bytes());
            hasher.update([0u8]);
            hasher.update(idf.to_bits().to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Split text into tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let owned;
        let text = if self.config.lowercase {
            owned = text.to_lowercase();
            owned.as_str()
        } else {
            text
        };

        token_pattern()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Tokens and their n-grams, in order of appearance
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenize(text);
        let (min_n, max_n) = self.config.ngram_range;
        let mut terms = Vec::new();

        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }

        terms
    }

    /// Learn the vocabulary and IDF weights from a corpus.
    ///
    /// Refitting replaces any previous vocabulary.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        self.config.validate()?;
        if documents.is_empty() {
            return Err(Error::training("cannot fit vectorizer on an empty corpus"));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_count: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = self.analyze(doc.as_ref());
            let mut seen = HashSet::new();
            for term in terms {
                *total_count.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.clone()) {
                    *doc_freq.entry(term).or_insert(0) += 1;
                }
            }
        }

        if doc_freq.is_empty() {
            return Err(Error::training(
                "empty vocabulary; corpus contains no tokens",
            ));
        }

        let n_docs = documents.len() as f64;
        let smooth_idf = |df: usize| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0;

        let mut ranked: Vec<(String, f64, f64)> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let idf = smooth_idf(df);
                let weight = total_count[&term] as f64 * idf;
                (term, weight, idf)
            })
            .collect();

        let candidates = ranked.len();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_features);
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        self.terms = ranked.iter().map(|(t, _, _)| t.clone()).collect();
        self.idf = ranked.iter().map(|(_, _, idf)| *idf).collect();
        self.vocabulary = self
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        info!(
            "Fitted vectorizer: {} of {} candidate terms kept from {} documents",
            self.terms.len(),
            candidates,
            documents.len()
        );

        Ok(())
    }

    /// Vectorize one text against the frozen vocabulary
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();

        let norm = weighted.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in weighted.iter_mut() {
                *v /= norm;
            }
        }

        SparseVector::from_pairs(self.vocabulary_size(), weighted)
    }

    /// Vectorize many texts
    pub fn transform_many<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    /// Fit, then vectorize the same corpus
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        debug!("Transforming {} fitted documents", documents.len());
        Ok(self.transform_many(documents))
    }
}
