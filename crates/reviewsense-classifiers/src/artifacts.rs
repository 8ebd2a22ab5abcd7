//! Persisted artifact set: vectorizer, classifier, and label codec
//!
//! The three pieces are stored as separate `bincode` files in one
//! directory. They are not versioned independently, so loading checks that
//! they fit together before handing out an [`ArtifactSet`]:
//! - the classifier input dimensionality equals the vocabulary size
//! - the classifier was trained against this exact vectorizer (SHA-256 over
//!   settings, vocabulary, and IDF weights)
//! - the classifier output classes equal the codec classes
//!
//! Saving builds the whole set in a staging directory next to the target
//! and swaps it in with renames, so the target directory only ever holds
//! one complete set.

use crate::codec::LabelCodec;
use crate::logistic::OneVsRestLogistic;
use crate::vectorizer::{SparseVector, TfidfVectorizer};
use reviewsense_core::{Error, Result, Sentiment};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const VECTORIZER_FILE: &str = "vectorizer.bin";
pub const MODEL_FILE: &str = "sentiment_model.bin";
pub const CODEC_FILE: &str = "label_encoder.bin";

/// Immutable, mutually consistent vectorizer + classifier + codec
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    vectorizer: TfidfVectorizer,
    classifier: OneVsRestLogistic,
    codec: LabelCodec,
}

impl ArtifactSet {
    /// Bundle fitted components, rejecting combinations that do not fit
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: OneVsRestLogistic,
        codec: LabelCodec,
    ) -> Result<Self> {
        check_compatibility(&vectorizer, &classifier, &codec)?;
        Ok(Self {
            vectorizer,
            classifier,
            codec,
        })
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &OneVsRestLogistic {
        &self.classifier
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    /// Vectorize, predict, and decode one text
    pub fn predict(&self, text: &str) -> Sentiment {
        let x = self.vectorizer.transform(text);
        self.decode_prediction(&x)
    }

    /// Decode the classifier's prediction for a feature vector
    pub fn decode_prediction(&self, x: &SparseVector) -> Sentiment {
        // Class count equality is checked on construction.
        self.codec.classes()[self.classifier.predict_one(x)]
    }

    /// Load from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        ArtifactStore::new(dir.as_ref()).load()
    }

    /// Save into a directory
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        ArtifactStore::new(dir.as_ref()).save(self)
    }
}

fn check_compatibility(
    vectorizer: &TfidfVectorizer,
    classifier: &OneVsRestLogistic,
    codec: &LabelCodec,
) -> Result<()> {
    if !vectorizer.is_fitted() {
        return Err(Error::corrupt_artifact("vectorizer has an empty vocabulary"));
    }
    classifier
        .validate()
        .map_err(|e| Error::corrupt_artifact(format!("classifier: {}", e)))?;
    LabelCodec::from_classes(codec.classes().to_vec())?;

    if classifier.n_features() != vectorizer.vocabulary_size() {
        return Err(Error::corrupt_artifact(format!(
            "classifier expects {} features but vocabulary has {} terms",
            classifier.n_features(),
            vectorizer.vocabulary_size()
        )));
    }
    if classifier.n_classes() != codec.n_classes() {
        return Err(Error::corrupt_artifact(format!(
            "classifier has {} classes but label codec has {}",
            classifier.n_classes(),
            codec.n_classes()
        )));
    }
    Ok(())
}

/// On-disk form of the classifier, tagged with what it was trained against
#[derive(Debug, Serialize, Deserialize)]
struct ClassifierArtifact {
    vectorizer_fingerprint: String,
    classes: Vec<Sentiment>,
    model: OneVsRestLogistic,
}

/// Reads and writes artifact sets in a directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether all three files are present
    pub fn exists(&self) -> bool {
        [VECTORIZER_FILE, MODEL_FILE, CODEC_FILE]
            .iter()
            .all(|name| self.dir.join(name).is_file())
    }

    /// Persist an artifact set, replacing whatever the directory held.
    ///
    /// The three files are written into a fresh sibling directory which is
    /// then renamed over the target; a previous set is moved aside first and
    /// removed afterwards. A reader sees the old set, the new set, or no
    /// directory at all, never a mixture.
    pub fn save(&self, artifacts: &ArtifactSet) -> Result<()> {
        let (parent, name) = self.split_dir()?;
        std::fs::create_dir_all(&parent)?;

        let tag = uuid::Uuid::new_v4().simple().to_string();
        let staging = parent.join(format!(".{}.staging-{}", name, tag));
        std::fs::create_dir(&staging)?;

        if let Err(e) = write_set(&staging, artifacts) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        if self.dir.exists() {
            let previous = parent.join(format!(".{}.previous-{}", name, tag));
            std::fs::rename(&self.dir, &previous)?;
            if let Err(e) = std::fs::rename(&staging, &self.dir) {
                let _ = std::fs::rename(&previous, &self.dir);
                let _ = std::fs::remove_dir_all(&staging);
                return Err(e.into());
            }
            if let Err(e) = std::fs::remove_dir_all(&previous) {
                warn!(
                    "Failed to remove previous artifact set {}: {}",
                    previous.display(),
                    e
                );
            }
        } else {
            std::fs::rename(&staging, &self.dir)?;
        }

        info!("Saved artifact set to {}", self.dir.display());
        Ok(())
    }

    fn split_dir(&self) -> Result<(PathBuf, String)> {
        let name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::config(format!(
                    "artifact directory {} has no final component",
                    self.dir.display()
                ))
            })?;
        let parent = match self.dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((parent, name))
    }

    /// Load and cross-check an artifact set
    pub fn load(&self) -> Result<ArtifactSet> {
        let codec: LabelCodec = self.read(CODEC_FILE)?;
        let vectorizer: TfidfVectorizer = self.read(VECTORIZER_FILE)?;
        let classifier: ClassifierArtifact = self.read(MODEL_FILE)?;

        if classifier.vectorizer_fingerprint != vectorizer.fingerprint() {
            return Err(Error::corrupt_artifact(
                "classifier was trained against a different vectorizer",
            ));
        }
        if classifier.classes != codec.classes() {
            return Err(Error::corrupt_artifact(format!(
                "classifier classes {:?} differ from label codec classes {:?}",
                classifier.classes,
                codec.classes()
            )));
        }

        let artifacts = ArtifactSet::new(vectorizer, classifier.model, codec)?;
        info!(
            "Loaded artifact set from {} ({} features, {} classes)",
            self.dir.display(),
            artifacts.vectorizer.vocabulary_size(),
            artifacts.codec.n_classes()
        );
        Ok(artifacts)
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(Error::corrupt_artifact(format!(
                "missing {} in {}",
                name,
                self.dir.display()
            )));
        }

        let bytes = std::fs::read(&path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| Error::corrupt_artifact(format!("Failed to decode {}: {}", name, e)))
    }
}

fn write_set(dir: &Path, artifacts: &ArtifactSet) -> Result<()> {
    let classifier = ClassifierArtifact {
        vectorizer_fingerprint: artifacts.vectorizer.fingerprint(),
        classes: artifacts.codec.classes().to_vec(),
        model: artifacts.classifier.clone(),
    };

    write_file(dir, CODEC_FILE, &artifacts.codec)?;
    write_file(dir, VECTORIZER_FILE, &artifacts.vectorizer)?;
    write_file(dir, MODEL_FILE, &classifier)
}

fn write_file<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value)
        .map_err(|e| Error::internal(format!("Failed to encode {}: {}", name, e)))?;
    std::fs::write(dir.join(name), &bytes)?;

    debug!("Wrote {} ({} bytes)", name, bytes.len());
    Ok(())
}
