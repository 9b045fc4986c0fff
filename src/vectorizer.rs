use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::features::SparseVector;

/// Turns normalized text into the feature space the classifier was trained on.
pub trait Vectorizer: Send + Sync {
    fn transform(&self, text: &str) -> Result<SparseVector>;

    fn n_features(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Serialized form written by the training pipeline.
#[derive(Debug, Deserialize)]
struct TfidfArtifact {
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Vec<f64>,
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    stop_words: Vec<String>,
    #[serde(default)]
    binary: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_true")]
    use_idf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    r"(?u)\b\w\w+\b".to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Fitted TF-IDF transform with a vocabulary fixed at training time.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    lowercase: bool,
    token_pattern: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    binary: bool,
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vectorizer {}", path.display()))?;
        let vectorizer = Self::from_json(&contents)
            .with_context(|| format!("Invalid vectorizer {}", path.display()))?;
        tracing::info!(
            n_features = vectorizer.n_features(),
            ngram_range = ?vectorizer.ngram_range,
            "Vectorizer loaded"
        );
        Ok(vectorizer)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: TfidfArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<&str> = self
            .token_pattern
            .captures_iter(&text)
            .filter_map(|captures| captures.get(1).or_else(|| captures.get(0)))
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        (min_n..=max_n.min(tokens.len()))
            .flat_map(|n| tokens.windows(n).map(|window| window.join(" ")))
            .collect()
    }

    fn weight(&self, index: usize, count: f64) -> f64 {
        let tf = if self.binary {
            1.0
        } else if self.sublinear_tf {
            1.0 + count.ln()
        } else {
            count
        };
        match &self.idf {
            Some(idf) => tf * idf[index],
            None => tf,
        }
    }

    fn from_artifact(artifact: TfidfArtifact) -> Result<Self> {
        let n_features = artifact.vocabulary.len();
        if n_features == 0 {
            bail!("Vocabulary is empty");
        }

        let mut columns = HashSet::with_capacity(n_features);
        for (term, &column) in &artifact.vocabulary {
            if column >= n_features {
                bail!("Term {term:?} maps to column {column}, vocabulary has {n_features} terms");
            }
            if !columns.insert(column) {
                bail!("Column {column} is assigned to more than one term");
            }
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            bail!("Invalid ngram_range ({min_n}, {max_n})");
        }

        let idf = if artifact.use_idf {
            if artifact.idf.len() != n_features {
                bail!(
                    "idf has {} weights, vocabulary has {n_features} terms",
                    artifact.idf.len()
                );
            }
            Some(artifact.idf)
        } else {
            None
        };

        let token_pattern = Regex::new(&artifact.token_pattern)
            .with_context(|| format!("Invalid token_pattern {:?}", artifact.token_pattern))?;
        if token_pattern.captures_len() > 2 {
            bail!("token_pattern may contain at most one capturing group");
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf,
            lowercase: artifact.lowercase,
            token_pattern,
            ngram_range: artifact.ngram_range,
            stop_words: artifact.stop_words.into_iter().collect(),
            binary: artifact.binary,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
        })
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, text: &str) -> Result<SparseVector> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.analyze(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        if counts.is_empty() {
            return Ok(SparseVector::zeros(self.n_features()));
        }

        let (indices, mut values): (Vec<usize>, Vec<f64>) = counts
            .into_iter()
            .map(|(index, count)| (index, self.weight(index, count)))
            .unzip();

        let scale = match self.norm {
            Some(Norm::L2) => values.iter().map(|v| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => values.iter().map(|v| v.abs()).sum(),
            None => 1.0,
        };
        if scale > 0.0 {
            values.iter_mut().for_each(|v| *v /= scale);
        }

        SparseVector::new(self.n_features(), indices, values)
    }

    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }
}
