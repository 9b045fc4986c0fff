use anyhow::{Context, Result, bail};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// WordNet detachment rules for nouns, tried in this order.
const NOUN_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// Upper bound on repeated reductions in [`Lemmatizer::base_form`].
const MAX_REDUCTIONS: usize = 8;

/// Noun lemmatizer backed by the WordNet noun index and exception list.
#[derive(Debug, Clone, Default)]
pub struct Lemmatizer {
    nouns: HashSet<String>,
    exceptions: HashMap<String, Vec<String>>,
}

impl Lemmatizer {
    /// Reads `corpora/wordnet/{index.noun,noun.exc}` from an NLTK data directory.
    pub fn load(resource_path: &Path) -> Result<Self> {
        let wordnet = resource_path.join("corpora").join("wordnet");
        let index_path = wordnet.join("index.noun");
        let exc_path = wordnet.join("noun.exc");

        let index = std::fs::read_to_string(&index_path)
            .with_context(|| format!("Failed to read WordNet index {}", index_path.display()))?;
        let exceptions = std::fs::read_to_string(&exc_path).with_context(|| {
            format!("Failed to read WordNet exceptions {}", exc_path.display())
        })?;

        let lemmatizer = Self::parse(&index, &exceptions);
        if lemmatizer.nouns.is_empty() {
            bail!("WordNet index {} has no lemmas", index_path.display());
        }
        tracing::debug!(
            nouns = lemmatizer.nouns.len(),
            exceptions = lemmatizer.exceptions.len(),
            "Loaded WordNet noun lexicon"
        );
        Ok(lemmatizer)
    }

    /// Builds a lexicon from the contents of `index.noun` and `noun.exc`.
    ///
    /// Index lines starting with a space belong to the license header.
    pub fn parse(index: &str, exceptions: &str) -> Self {
        let nouns = index
            .lines()
            .filter(|line| !line.starts_with(' '))
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect();

        let exceptions = exceptions
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let inflected = fields.next()?.to_string();
                let bases: Vec<String> = fields.map(str::to_string).collect();
                Some((inflected, bases))
            })
            .collect();

        Self { nouns, exceptions }
    }

    /// Dictionary form of `word` read as a noun, or `word` itself when unknown.
    ///
    /// The shortest candidate wins; ties go to the earliest one.
    pub fn lemmatize(&self, word: &str) -> String {
        self.morphy(word)
            .into_iter()
            .min_by_key(|lemma| lemma.chars().count())
            .unwrap_or_else(|| word.to_string())
    }

    /// Applies [`Lemmatizer::lemmatize`] until the word stops changing.
    pub fn base_form(&self, word: &str) -> String {
        let mut current = word.to_string();
        let mut visited = Vec::new();

        for _ in 0..MAX_REDUCTIONS {
            let next = self.lemmatize(&current);
            if next == current || visited.contains(&next) {
                break;
            }
            visited.push(std::mem::replace(&mut current, next));
        }
        current
    }

    fn morphy(&self, form: &str) -> Vec<String> {
        if let Some(bases) = self.exceptions.get(form) {
            return self.known(std::iter::once(form).chain(bases.iter().map(String::as_str)));
        }

        let mut forms = apply_rules(&[form.to_string()]);
        let results = self.known(std::iter::once(form).chain(forms.iter().map(String::as_str)));
        if !results.is_empty() {
            return results;
        }

        // Every rule but men->man shortens the form, so this terminates.
        while !forms.is_empty() {
            forms = apply_rules(&forms);
            let results = self.known(forms.iter().map(String::as_str));
            if !results.is_empty() {
                return results;
            }
        }
        Vec::new()
    }

    /// Candidates present in the noun index, deduplicated in order.
    fn known<'a>(&self, forms: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        forms
            .filter(|form| self.nouns.contains(*form) && is_plain_token(form))
            .filter(|form| seen.insert(*form))
            .map(str::to_string)
            .collect()
    }
}

fn apply_rules(forms: &[String]) -> Vec<String> {
    forms
        .iter()
        .flat_map(|form| {
            NOUN_SUBSTITUTIONS
                .iter()
                .filter_map(move |&(old, new)| form.strip_suffix(old).map(|stem| format!("{stem}{new}")))
        })
        .collect()
}

// Lemmas with punctuation or spaces could not survive another normalization pass.
fn is_plain_token(form: &str) -> bool {
    !form
        .chars()
        .any(|c| c.is_ascii_punctuation() || c.is_whitespace())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const INDEX_NOUN: &str = "  1 This software and database is being provided to you, the LICENSEE, by
  2 Princeton University under the following license.
box n 2 1 @ 2 0 02883344 13775706
capital n 6 3 @ ~ + 6 3 08518505 13354420 08683834 03753933 06823005 13390983
cat n 8 2 @ ~ 8 1 02121620 10153414
church n 4 2 @ ~ 4 1 03028079 08081668
co n 2 1 @ 2 0 14803074 09863031
cos n 2 1 @ 2 0 14803074 12019293
france n 2 1 @ 2 0 08929922 11063211
glass n 7 2 @ ~ 7 1 14881303 03438257
glasses n 1 1 @ 1 0 04272054
hello n 1 1 @ 1 0 06628861
man n 11 2 @ ~ 11 4 10287213 02472987
mouse n 4 2 @ ~ 4 0 02330245 03793489
running n 6 2 @ ~ 6 1 00795720 00558883
weather n 1 1 @ 1 0 11524662
will n 3 2 @ ~ 3 1 05652926 09999532
wolf n 5 2 @ ~ 5 1 02114100 10787470
world n 8 2 @ ~ 8 4 09466280 08227214
";

    pub(crate) const NOUN_EXC: &str = "mice mouse
wolves wolf
men man
";

    fn lexicon() -> Lemmatizer {
        Lemmatizer::parse(INDEX_NOUN, NOUN_EXC)
    }

    #[test]
    fn header_lines_are_not_lemmas() {
        let lemmatizer = lexicon();
        assert!(!lemmatizer.nouns.contains("1"));
        assert!(lemmatizer.nouns.contains("cat"));
    }

    #[test]
    fn regular_plurals_detach_suffixes() {
        let lemmatizer = lexicon();

        assert_eq!(lemmatizer.lemmatize("cats"), "cat");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
        assert_eq!(lemmatizer.lemmatize("churches"), "church");
        assert_eq!(lemmatizer.lemmatize("capitals"), "capital");
    }

    #[test]
    fn irregular_forms_use_exceptions() {
        let lemmatizer = lexicon();

        assert_eq!(lemmatizer.lemmatize("mice"), "mouse");
        assert_eq!(lemmatizer.lemmatize("wolves"), "wolf");
        assert_eq!(lemmatizer.lemmatize("men"), "man");
    }

    #[test]
    fn shortest_known_candidate_wins() {
        // Both "glasses" and "glass" are nouns.
        assert_eq!(lexicon().lemmatize("glasses"), "glass");
    }

    #[test]
    fn base_and_unknown_words_are_unchanged() {
        let lemmatizer = lexicon();

        assert_eq!(lemmatizer.lemmatize("running"), "running");
        assert_eq!(lemmatizer.lemmatize("xyzzys"), "xyzzys");
        assert_eq!(lemmatizer.lemmatize(""), "");
    }

    #[test]
    fn base_form_reaches_a_fixed_point() {
        let lemmatizer = lexicon();

        // coses -> cos -> co
        assert_eq!(lemmatizer.lemmatize("coses"), "cos");
        assert_eq!(lemmatizer.base_form("coses"), "co");
        assert_eq!(lemmatizer.base_form("co"), "co");
    }

    #[test]
    fn punctuated_lemmas_are_ignored() {
        let lemmatizer = Lemmatizer::parse("t-shirt n 1 1 @ 1 0 04456115\n", "tshirts t-shirt\n");
        assert_eq!(lemmatizer.lemmatize("tshirts"), "tshirts");
    }

    #[test]
    fn load_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let wordnet = dir.path().join("corpora").join("wordnet");
        std::fs::create_dir_all(&wordnet).unwrap();
        std::fs::write(wordnet.join("index.noun"), INDEX_NOUN).unwrap();

        let err = Lemmatizer::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("noun.exc"));

        std::fs::write(wordnet.join("noun.exc"), NOUN_EXC).unwrap();
        let lemmatizer = Lemmatizer::load(dir.path()).unwrap();
        assert_eq!(lemmatizer.lemmatize("mice"), "mouse");
    }
}
