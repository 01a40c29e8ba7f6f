//! Tokens flowing through the analysis pipeline.
//!
//! ```
//! use colloquy::analysis::token::Token;
//!
//! let token = Token::with_offsets("world", 1, 6, 11);
//! assert_eq!(token.text, "world");
//! assert_eq!(&"hello world"[token.start_offset..token.end_offset], "world");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// One word or punctuation mark of an utterance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Index among the tokens the tokenizer emitted.
    pub position: usize,
    /// Byte range in the source utterance.
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Self::with_offsets(text, position, 0, 0)
    }

    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Same token carrying different text, as produced by a filter.
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        Token {
            text: text.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lazily evaluated sequence of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;
