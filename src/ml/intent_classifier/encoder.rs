//! Bag-of-words feature encoding.
//!
//! The only place that decides vector layout: feature `i` corresponds to
//! word `i` of the [`Vocabulary`], output `i` to tag `i` of the [`TagList`].

use crate::analysis::IntentAnalyzer;
use crate::error::{ColloquyError, Result};

use super::types::{Document, TrainingExample};
use super::vocabulary::{TagList, Vocabulary};

/// Binary presence vector of `tokens` over `vocabulary`.
///
/// Repeated words still produce `1.0`; words outside the vocabulary are
/// ignored, so unseen input encodes to all zeros.
pub fn encode<S: AsRef<str>>(tokens: &[S], vocabulary: &Vocabulary) -> Vec<f32> {
    let mut features = vec![0.0; vocabulary.len()];
    for token in tokens {
        if let Some(i) = vocabulary.index_of(token.as_ref()) {
            features[i] = 1.0;
        }
    }
    features
}

/// Analyze raw text and encode the resulting lemmas.
pub fn encode_text(
    analyzer: &IntentAnalyzer,
    text: &str,
    vocabulary: &Vocabulary,
) -> Result<Vec<f32>> {
    let lemmas = analyzer.lemmas(text)?;
    Ok(encode(&lemmas, vocabulary))
}

/// One-hot vector for `tag`.
pub fn encode_label(tag: &str, tags: &TagList) -> Result<Vec<f32>> {
    let index = tags
        .index_of(tag)
        .ok_or_else(|| ColloquyError::other(format!("unknown tag '{tag}'")))?;
    let mut label = vec![0.0; tags.len()];
    label[index] = 1.0;
    Ok(label)
}

/// Encode every document into a training example.
pub fn encode_documents(
    documents: &[Document],
    vocabulary: &Vocabulary,
    tags: &TagList,
) -> Result<Vec<TrainingExample>> {
    documents
        .iter()
        .map(|doc| {
            Ok(TrainingExample {
                features: encode(&doc.tokens, vocabulary),
                label: encode_label(&doc.tag, tags)?,
            })
        })
        .collect()
}
