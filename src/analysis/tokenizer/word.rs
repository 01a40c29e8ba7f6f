//! Word tokenizer implementation.
//!
//! Splits text on Unicode word boundaries (UAX #29). Unlike a pure word
//! extractor it keeps punctuation segments as their own tokens, so that
//! `"hi there!"` yields `hi`, `there` and `!`; the ignore filter further down
//! the pipeline decides which of those survive. Whitespace is never a token.
//!
//! # Examples
//!
//! ```
//! use colloquy::analysis::tokenizer::Tokenizer;
//! use colloquy::analysis::tokenizer::word::WordTokenizer;
//!
//! let tokenizer = WordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("What's up, café?").unwrap().collect();
//!
//! assert_eq!(tokens[0].text, "What's");
//! assert_eq!(tokens[1].text, "up");
//! assert_eq!(tokens[2].text, ",");
//! assert_eq!(tokens[3].text, "café");
//! assert_eq!(tokens[4].text, "?");
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    /// Create a new word tokenizer.
    pub fn new() -> Self {
        WordTokenizer
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, segment)| !segment.chars().all(char::is_whitespace))
            .enumerate()
            .map(|(position, (start_offset, segment))| {
                Token::with_offsets(
                    segment,
                    position,
                    start_offset,
                    start_offset + segment.len(),
                )
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "word"
    }
}
