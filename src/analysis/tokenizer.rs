//! Tokenizer implementations for text analysis.
//!
//! Tokenizers are the first step of the pipeline: they split an utterance
//! into raw, case-preserving tokens in reading order.
//!
//! # Available Tokenizers
//!
//! - [`word::WordTokenizer`] - Unicode word boundaries, punctuation kept as tokens
//! - [`regex::RegexTokenizer`] - Custom regex-based tokenization
//!
//! # Examples
//!
//! ```
//! use colloquy::analysis::tokenizer::Tokenizer;
//! use colloquy::analysis::tokenizer::word::WordTokenizer;
//!
//! let tokenizer = WordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hi there!").unwrap().collect();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[2].text, "!");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so analyzers can be shared behind `Arc`.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod regex;
pub mod word;

pub use regex::RegexTokenizer;
pub use word::WordTokenizer;
