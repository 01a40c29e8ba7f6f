//! Corpus types for intent classification.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};

/// One intent of the corpus: a tag, example utterances and reply templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Intent label.
    pub tag: String,
    /// Example utterances.
    pub patterns: Vec<String>,
    /// Candidate replies; one is chosen at random per turn.
    pub responses: Vec<String>,
}

impl Intent {
    pub fn new<T, P, R>(tag: T, patterns: P, responses: R) -> Self
    where
        T: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Intent {
            tag: tag.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            responses: responses.into_iter().map(Into::into).collect(),
        }
    }
}

/// Labeled training corpus, in the order the intents were declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentCorpus {
    pub intents: Vec<Intent>,
}

impl IntentCorpus {
    /// Build a corpus from intents and validate it.
    pub fn new(intents: Vec<Intent>) -> Result<Self> {
        let corpus = IntentCorpus { intents };
        corpus.validate()?;
        Ok(corpus)
    }

    /// Read a corpus from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                ColloquyError::not_found(format!("intents file {}", path.display()))
            }
            _ => ColloquyError::Io(e),
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a corpus of the form `{"intents": [{"tag", "patterns", "responses"}]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ColloquyError::configuration(format!("intents are not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.get("intents").is_none() {
            return Err(ColloquyError::configuration(
                "intents document has no \"intents\" key",
            ));
        }
        let corpus: IntentCorpus = serde_json::from_value(value)
            .map_err(|e| ColloquyError::configuration(format!("malformed intents: {e}")))?;
        corpus.validate()?;
        Ok(corpus)
    }

    /// Check the corpus invariants: at least one intent, every intent has a
    /// pattern and a response, tags are unique.
    pub fn validate(&self) -> Result<()> {
        if self.intents.is_empty() {
            return Err(ColloquyError::configuration("intents list is empty"));
        }

        let mut seen = HashSet::with_capacity(self.intents.len());
        for intent in &self.intents {
            if intent.tag.is_empty() {
                return Err(ColloquyError::configuration("intent with an empty tag"));
            }
            if intent.patterns.is_empty() {
                return Err(ColloquyError::configuration(format!(
                    "intent '{}' has no patterns",
                    intent.tag
                )));
            }
            if intent.responses.is_empty() {
                return Err(ColloquyError::configuration(format!(
                    "intent '{}' has no responses",
                    intent.tag
                )));
            }
            if !seen.insert(intent.tag.as_str()) {
                return Err(ColloquyError::configuration(format!(
                    "duplicate intent tag '{}'",
                    intent.tag
                )));
            }
        }
        Ok(())
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Look up an intent by tag.
    pub fn intent(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Total number of patterns, i.e. of training examples.
    pub fn pattern_count(&self) -> usize {
        self.intents.iter().map(|intent| intent.patterns.len()).sum()
    }
}

/// The normalized tokens of one pattern together with its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub tokens: Vec<String>,
    pub tag: String,
}

/// An encoded training pair: bag-of-words input and one-hot label.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: Vec<f32>,
    pub label: Vec<f32>,
}
