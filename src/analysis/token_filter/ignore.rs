//! Ignore filter implementation.
//!
//! Removes tokens whose text is exactly one of a fixed set of strings. The
//! default set is the punctuation `! ? , .`; anything else, including
//! punctuation outside the set, passes through untouched.
//!
//! # Examples
//!
//! ```
//! use colloquy::analysis::token_filter::Filter;
//! use colloquy::analysis::token_filter::ignore::IgnoreFilter;
//! use colloquy::analysis::token::Token;
//!
//! let filter = IgnoreFilter::new();
//! let tokens = vec![Token::new("hi", 0), Token::new("!", 1)];
//!
//! let result: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(result.len(), 1);
//! assert_eq!(result[0].text, "hi");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Tokens dropped by default before normalization.
pub const DEFAULT_IGNORE_TOKENS: &[&str] = &["!", "?", ",", "."];

/// A filter that drops tokens found in an ignore-set.
#[derive(Clone, Debug)]
pub struct IgnoreFilter {
    ignored: Arc<HashSet<String>>,
}

impl IgnoreFilter {
    /// Create a filter with the default punctuation ignore-set.
    pub fn new() -> Self {
        Self::from_tokens(DEFAULT_IGNORE_TOKENS.iter().copied())
    }

    /// Create a filter with a custom ignore-set.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IgnoreFilter {
            ignored: Arc::new(tokens.into_iter().map(Into::into).collect()),
        }
    }

    /// Check if a token text is ignored.
    pub fn is_ignored(&self, text: &str) -> bool {
        self.ignored.contains(text)
    }

    /// Number of entries in the ignore-set.
    pub fn len(&self) -> usize {
        self.ignored.len()
    }

    /// Whether the ignore-set is empty.
    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty()
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for IgnoreFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens: Vec<Token> = tokens
            .filter(|token| !self.is_ignored(&token.text))
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "ignore"
    }
}
