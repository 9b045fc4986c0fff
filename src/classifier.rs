use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use crate::features::SparseVector;

/// Binary classifier over vectorized text.
pub trait Classifier: Send + Sync {
    /// Returns the raw class value the model was trained with.
    fn predict(&self, features: &SparseVector) -> Result<i64>;

    fn n_features(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: i32 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Kernel {
    fn eval(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        match *self {
            Kernel::Linear => a.dot(b),
            Kernel::Rbf { gamma } => (-gamma * a.squared_distance(b)).exp(),
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * a.dot(b) + coef0).powi(degree),
            Kernel::Sigmoid { gamma, coef0 } => (gamma * a.dot(b) + coef0).tanh(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SparseRow {
    indices: Vec<usize>,
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SvmArtifact {
    Linear {
        coef: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_classes")]
        classes: [i64; 2],
    },
    Kernel {
        kernel: Kernel,
        n_features: usize,
        support_vectors: Vec<SparseRow>,
        dual_coef: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_classes")]
        classes: [i64; 2],
    },
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

#[derive(Debug, Clone)]
enum DecisionFunction {
    Linear {
        coef: Vec<f64>,
        intercept: f64,
    },
    Kernel {
        kernel: Kernel,
        n_features: usize,
        support_vectors: Vec<SparseVector>,
        dual_coef: Vec<f64>,
        intercept: f64,
    },
}

/// Support vector classifier exported from the training pipeline.
///
/// A positive decision value selects `classes[1]`, anything else `classes[0]`.
#[derive(Debug, Clone)]
pub struct SvmClassifier {
    decision: DecisionFunction,
    classes: [i64; 2],
}

impl SvmClassifier {
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model {}", path.display()))?;
        let classifier = Self::from_json(&contents)
            .with_context(|| format!("Invalid model {}", path.display()))?;
        tracing::info!(
            kind = classifier.kind(),
            n_features = classifier.n_features(),
            classes = ?classifier.classes,
            "Classifier loaded"
        );
        Ok(classifier)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: SvmArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: SvmArtifact) -> Result<Self> {
        match artifact {
            SvmArtifact::Linear {
                coef,
                intercept,
                classes,
            } => {
                if coef.is_empty() {
                    bail!("Linear model has no coefficients");
                }
                Ok(Self {
                    decision: DecisionFunction::Linear { coef, intercept },
                    classes,
                })
            }
            SvmArtifact::Kernel {
                kernel,
                n_features,
                support_vectors,
                dual_coef,
                intercept,
                classes,
            } => {
                if support_vectors.is_empty() {
                    bail!("Kernel model has no support vectors");
                }
                if dual_coef.len() != support_vectors.len() {
                    bail!(
                        "dual_coef has {} entries for {} support vectors",
                        dual_coef.len(),
                        support_vectors.len()
                    );
                }
                let support_vectors = support_vectors
                    .into_iter()
                    .enumerate()
                    .map(|(i, row)| {
                        SparseVector::new(n_features, row.indices, row.values)
                            .with_context(|| format!("Invalid support vector {i}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self {
                    decision: DecisionFunction::Kernel {
                        kernel,
                        n_features,
                        support_vectors,
                        dual_coef,
                        intercept,
                    },
                    classes,
                })
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self.decision {
            DecisionFunction::Linear { .. } => "linear",
            DecisionFunction::Kernel { .. } => "kernel",
        }
    }

    pub fn decision_function(&self, features: &SparseVector) -> Result<f64> {
        if features.dim() != self.n_features() {
            bail!(
                "X has {} features, but the classifier is expecting {} features as input",
                features.dim(),
                self.n_features()
            );
        }

        let value = match &self.decision {
            DecisionFunction::Linear { coef, intercept } => features.dot_dense(coef) + intercept,
            DecisionFunction::Kernel {
                kernel,
                support_vectors,
                dual_coef,
                intercept,
                ..
            } => {
                support_vectors
                    .iter()
                    .zip(dual_coef)
                    .map(|(sv, alpha)| alpha * kernel.eval(sv, features))
                    .sum::<f64>()
                    + intercept
            }
        };

        if !value.is_finite() {
            bail!("Decision function produced a non-finite value");
        }
        Ok(value)
    }
}

impl Classifier for SvmClassifier {
    fn predict(&self, features: &SparseVector) -> Result<i64> {
        let value = self.decision_function(features)?;
        // A zero decision goes to the first class for linear models and to the
        // second class for kernel models, following their respective solvers.
        let positive = match self.decision {
            DecisionFunction::Linear { .. } => value > 0.0,
            DecisionFunction::Kernel { .. } => value >= 0.0,
        };
        let class = if positive {
            self.classes[1]
        } else {
            self.classes[0]
        };
        tracing::trace!(decision = value, class, "Decision computed");
        Ok(class)
    }

    fn n_features(&self) -> usize {
        match &self.decision {
            DecisionFunction::Linear { coef, .. } => coef.len(),
            DecisionFunction::Kernel { n_features, .. } => *n_features,
        }
    }
}
