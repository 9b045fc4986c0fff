use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::classifier::{Classifier, SvmClassifier};
use crate::config::ArtifactConfig;
use crate::engine::Engine;
use crate::normalizer::Normalizer;
use crate::types::Label;
use crate::vectorizer::{TfidfVectorizer, Vectorizer};

/// normalize -> vectorize -> classify, over artifacts that never change after load.
pub struct Pipeline {
    normalizer: Normalizer,
    vectorizer: Box<dyn Vectorizer>,
    classifier: Box<dyn Classifier>,
}

impl Pipeline {
    pub fn new(
        normalizer: Normalizer,
        vectorizer: Box<dyn Vectorizer>,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        if vectorizer.n_features() != classifier.n_features() {
            tracing::warn!(
                vectorizer_features = vectorizer.n_features(),
                classifier_features = classifier.n_features(),
                "Vectorizer and classifier disagree on feature count; predictions will fail"
            );
        }
        Self {
            normalizer,
            vectorizer,
            classifier,
        }
    }

    /// Loads every artifact named in `config`. Any failure here is fatal.
    #[tracing::instrument(skip(config))]
    pub fn load(config: &ArtifactConfig) -> Result<Self> {
        let normalizer = Normalizer::load(&config.resource_path, &config.stopword_language)
            .context("Failed to load linguistic resources")?;
        let vectorizer = TfidfVectorizer::from_file(&config.vectorizer_path)?;
        let classifier = SvmClassifier::from_file(&config.model_path)?;

        Ok(Self::new(
            normalizer,
            Box::new(vectorizer),
            Box::new(classifier),
        ))
    }

    pub fn predict(&self, text: &str) -> Result<Label> {
        let preprocessed = self.normalizer.normalize(text);
        if preprocessed.is_empty() {
            tracing::debug!("Text normalized to nothing, classifying the empty document");
        }
        tracing::debug!(preprocessed = %preprocessed, "Preprocessed text");

        let features = self.vectorizer.transform(&preprocessed)?;
        tracing::trace!(nnz = features.nnz(), "Vectorized");
        let class = self.classifier.predict(&features)?;
        let label = Label::from_class(class);
        tracing::debug!(class, label = label.as_str(), "Prediction");
        Ok(label)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("normalizer", &self.normalizer)
            .field("vectorizer_features", &self.vectorizer.n_features())
            .field("classifier_features", &self.classifier.n_features())
            .finish()
    }
}

pub struct PipelineEngine {
    pipeline: Arc<Pipeline>,
}

impl PipelineEngine {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[async_trait]
impl Engine for PipelineEngine {
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    async fn predict(&self, text: String) -> Result<Label> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || pipeline.predict(&text)).await?
    }
}
