use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::path::Path;

/// Fixed, language-specific list of words dropped before lemmatization.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Reads `corpora/stopwords/<language>` from an NLTK data directory.
    pub fn load(resource_path: &Path, language: &str) -> Result<Self> {
        let path = resource_path
            .join("corpora")
            .join("stopwords")
            .join(language);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read stopword list {}", path.display()))?;

        let stopwords = Self::parse(&contents);
        if stopwords.is_empty() {
            bail!("Stopword list {} is empty", path.display());
        }
        tracing::debug!(language, count = stopwords.len(), "Loaded stopwords");
        Ok(stopwords)
    }

    /// One word per line; blank lines are ignored.
    pub fn parse(contents: &str) -> Self {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}
