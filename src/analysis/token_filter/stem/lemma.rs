//! Dictionary-backed lemmatizer.
//!
//! Irregular English forms ("went", "children", "bought") are looked up in a
//! fixed exception table; every other word falls through to the
//! [`PorterStemmer`] suffix rules. The result is a canonical base form rather
//! than always a dictionary headword ("flies" becomes "fli"), which is all the
//! bag-of-words encoder needs: equal inputs map to equal lemmas.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::analysis::token_filter::stem::{PorterStemmer, Stemmer};

static IRREGULAR_FORMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        // be / have / do
        ("am", "be"),
        ("is", "be"),
        ("are", "be"),
        ("was", "be"),
        ("were", "be"),
        ("been", "be"),
        ("being", "be"),
        ("has", "have"),
        ("had", "have"),
        ("having", "have"),
        ("does", "do"),
        ("did", "do"),
        ("done", "do"),
        ("doing", "do"),
        // irregular verbs
        ("went", "go"),
        ("gone", "go"),
        ("goes", "go"),
        ("ran", "run"),
        ("bought", "buy"),
        ("sold", "sell"),
        ("made", "make"),
        ("said", "say"),
        ("got", "get"),
        ("gotten", "get"),
        ("saw", "see"),
        ("seen", "see"),
        ("took", "take"),
        ("taken", "take"),
        ("gave", "give"),
        ("given", "give"),
        ("knew", "know"),
        ("known", "know"),
        ("thought", "think"),
        ("told", "tell"),
        ("found", "find"),
        ("came", "come"),
        ("brought", "bring"),
        ("kept", "keep"),
        ("held", "hold"),
        ("lost", "lose"),
        ("paid", "pay"),
        ("spent", "spend"),
        ("sent", "send"),
        ("shown", "show"),
        ("wrote", "write"),
        ("written", "write"),
        // irregular plurals
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("people", "person"),
        ("mice", "mouse"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("data", "datum"),
    ]
    .into_iter()
    .collect()
});

/// Lemmatizer combining an irregular-form table with Porter suffix rules.
#[derive(Debug, Clone, Default)]
pub struct Lemmatizer {
    fallback: PorterStemmer,
}

impl Lemmatizer {
    /// Create a new lemmatizer.
    pub fn new() -> Self {
        Lemmatizer {
            fallback: PorterStemmer::new(),
        }
    }

    /// Look up an irregular form without applying suffix rules.
    pub fn irregular(word: &str) -> Option<&'static str> {
        IRREGULAR_FORMS.get(word).copied()
    }
}

impl Stemmer for Lemmatizer {
    fn stem(&self, word: &str) -> String {
        let lowered = word.to_lowercase();
        match Self::irregular(&lowered) {
            Some(lemma) => lemma.to_string(),
            None => self.fallback.stem(&lowered),
        }
    }

    fn name(&self) -> &'static str {
        "lemma"
    }
}
