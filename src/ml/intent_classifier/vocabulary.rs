//! Vocabulary and tag-list construction.

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::IntentAnalyzer;
use crate::error::{ColloquyError, Result};

use super::types::{Document, IntentCorpus};

/// Sorted, deduplicated lemmas. Position `i` is feature `i` of the encoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    words: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Vocabulary {
    /// Sort and deduplicate `words` into a vocabulary.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: Vec<String> = words.into_iter().map(Into::into).collect();
        words.sort();
        words.dedup();
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        Vocabulary { words, index }
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(words: Vec<String>) -> Self {
        Vocabulary::from_words(words)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.words
    }
}

/// Distinct tags in first-seen order. Position `i` is output `i` of the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagList {
    tags: Vec<String>,
}

impl TagList {
    /// Keep the first occurrence of every tag.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = TagList::default();
        for tag in tags {
            list.push(tag.into());
        }
        list
    }

    fn push(&mut self, tag: String) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tags.get(index).map(String::as_str)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Output of [`VocabularyBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltVocabulary {
    pub vocabulary: Vocabulary,
    pub tags: TagList,
    /// One document per pattern, in corpus order.
    pub documents: Vec<Document>,
}

/// Derives the vocabulary, tag list and tokenized documents from a corpus.
pub struct VocabularyBuilder<'a> {
    analyzer: &'a IntentAnalyzer,
}

impl<'a> VocabularyBuilder<'a> {
    pub fn new(analyzer: &'a IntentAnalyzer) -> Self {
        VocabularyBuilder { analyzer }
    }

    pub fn build(&self, corpus: &IntentCorpus) -> Result<BuiltVocabulary> {
        let mut tags = TagList::default();
        let mut lemmas = Vec::new();
        let mut documents = Vec::with_capacity(corpus.pattern_count());

        for intent in corpus.intents() {
            tags.push(intent.tag.clone());
            for pattern in &intent.patterns {
                let tokens = self.analyzer.lemmas(pattern)?;
                lemmas.extend(tokens.iter().cloned());
                documents.push(Document {
                    tokens,
                    tag: intent.tag.clone(),
                });
            }
        }

        if documents.is_empty() {
            return Err(ColloquyError::configuration("corpus has no patterns"));
        }

        let vocabulary = Vocabulary::from_words(lemmas);
        if vocabulary.is_empty() {
            return Err(ColloquyError::configuration(
                "vocabulary is empty: no pattern contains a word",
            ));
        }

        debug!(
            "Built vocabulary of {} words, {} tags, {} documents",
            vocabulary.len(),
            tags.len(),
            documents.len()
        );

        Ok(BuiltVocabulary {
            vocabulary,
            tags,
            documents,
        })
    }
}
