use anyhow::Result;
use std::path::Path;

use crate::lemmatizer::Lemmatizer;
use crate::stopwords::StopWords;

/// Text normalization applied before vectorization.
///
/// Lowercases, removes ASCII punctuation, splits on whitespace, drops stop
/// words and reduces each remaining token to its noun base form. Tokens whose
/// base form is itself a stop word are dropped as well, so normalizing twice
/// gives the same result as normalizing once.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: StopWords,
    lemmatizer: Lemmatizer,
}

impl Normalizer {
    pub fn new(stopwords: StopWords, lemmatizer: Lemmatizer) -> Self {
        Self {
            stopwords,
            lemmatizer,
        }
    }

    #[tracing::instrument(skip(resource_path), fields(resource_path = %resource_path.display()))]
    pub fn load(resource_path: &Path, language: &str) -> Result<Self> {
        let stopwords = StopWords::load(resource_path, language)?;
        let lemmatizer = Lemmatizer::load(resource_path)?;
        Ok(Self::new(stopwords, lemmatizer))
    }

    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let stripped: String = lowered
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect();

        stripped
            .split(is_separator)
            .filter(|token| !token.is_empty())
            .filter(|token| !self.stopwords.contains(token))
            .map(|token| self.lemmatizer.base_form(token))
            .filter(|lemma| !self.stopwords.contains(lemma))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Unicode whitespace plus the ASCII information separators (U+001C..=U+001F),
/// which also delimit tokens.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lemmatizer::tests::{INDEX_NOUN, NOUN_EXC};
    use proptest::prelude::*;

    pub(crate) const STOPWORDS: &str = "i\nme\nmy\nwe\nyou\nhe\nshe\nit\nits\nthey\nwhat\nwhich\nwho\n\
        this\nthat\nam\nis\nare\nwas\nwere\nbe\nbeen\nhave\nhas\ndo\ndoes\ndid\na\nan\nthe\nand\n\
        but\nif\nor\nof\nat\nby\nfor\nwith\nabout\nto\nfrom\nin\non\nhow\nall\nno\nnot\ncan\nwill\n\
        just\ndon\nshould\nnow\n";

    pub(crate) fn normalizer() -> Normalizer {
        Normalizer::new(
            StopWords::parse(STOPWORDS),
            Lemmatizer::parse(INDEX_NOUN, NOUN_EXC),
        )
    }

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalizer().normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn all_stopwords_normalize_to_empty() {
        assert_eq!(normalizer().normalize("is the a"), "");
        assert_eq!(normalizer().normalize(""), "");
        assert_eq!(normalizer().normalize("  ?!  "), "");
    }

    #[test]
    fn lemmatizes_surviving_tokens() {
        let normalizer = normalizer();

        assert_eq!(
            normalizer.normalize("What is the capital of France?"),
            "capital france"
        );
        assert_eq!(normalizer.normalize("The cats are RUNNING"), "cat running");
        assert_eq!(normalizer.normalize("mice,  wolves\tand men"), "mouse wolf man");
    }

    #[test]
    fn information_separators_split_tokens() {
        let normalizer = normalizer();

        assert_eq!(normalizer.normalize("hello\u{1f}world"), "hello world");
        assert_eq!(
            normalizer.normalize("cats\u{1c}wolves\u{1d}\u{1e}mice"),
            "cat wolf mouse"
        );
        assert_eq!(normalizer.normalize("\u{1f}\u{2028}\u{a0}"), "");
    }

    #[test]
    fn punctuation_inside_words_is_removed_not_split() {
        // "don't" becomes "dont", which is not a stop word.
        assert_eq!(normalizer().normalize("don't e-mail"), "dont email");
    }

    #[test]
    fn lemmas_that_are_stopwords_are_dropped() {
        assert_eq!(normalizer().normalize("wills"), "");
    }

    #[test]
    fn load_reads_both_corpora() {
        let dir = tempfile::tempdir().unwrap();
        let stopwords = dir.path().join("corpora").join("stopwords");
        let wordnet = dir.path().join("corpora").join("wordnet");
        std::fs::create_dir_all(&stopwords).unwrap();
        std::fs::create_dir_all(&wordnet).unwrap();
        std::fs::write(stopwords.join("english"), STOPWORDS).unwrap();
        std::fs::write(wordnet.join("index.noun"), INDEX_NOUN).unwrap();
        std::fs::write(wordnet.join("noun.exc"), NOUN_EXC).unwrap();

        let normalizer = Normalizer::load(dir.path(), "english").unwrap();
        assert_eq!(normalizer.normalize("Boxes of glasses"), "box glass");
    }

    fn phrase() -> impl Strategy<Value = String> {
        let word = prop_oneof![
            Just("Cats".to_string()),
            Just("the".to_string()),
            Just("glasses".to_string()),
            Just("coses".to_string()),
            Just("wills".to_string()),
            Just("MICE".to_string()),
            "[a-zA-Z']{1,10}",
        ];
        let separator = prop_oneof![Just(" "), Just(", "), Just("\t"), Just("?! "), Just("-")];
        prop::collection::vec((word, separator), 0..12).prop_map(|parts| {
            parts
                .into_iter()
                .map(|(word, separator)| format!("{word}{separator}"))
                .collect::<String>()
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(text in phrase()) {
            let normalizer = normalizer();
            let once = normalizer.normalize(&text);
            prop_assert_eq!(normalizer.normalize(&once), once);
        }

        #[test]
        fn normalize_is_idempotent_on_arbitrary_text(text in "\\PC{0,64}") {
            let normalizer = normalizer();
            let once = normalizer.normalize(&text);
            prop_assert_eq!(normalizer.normalize(&once), once);
        }

        #[test]
        fn output_has_no_punctuation_or_uppercase(text in phrase()) {
            let normalized = normalizer().normalize(&text);
            prop_assert!(!normalized.chars().any(|c| c.is_ascii_punctuation() || c.is_ascii_uppercase()));
            prop_assert!(!normalized.contains("  "));
        }
    }
}
