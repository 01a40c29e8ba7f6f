//! Token filter implementations for token transformation.
//!
//! # Available Filters
//!
//! - [`ignore::IgnoreFilter`] - Drops tokens from a fixed ignore-set (punctuation)
//! - [`lowercase::LowercaseFilter`] - Converts tokens to lowercase
//! - [`stem::StemFilter`] - Reduces words to their canonical form
//!
//! # Examples
//!
//! ```
//! use colloquy::analysis::token_filter::Filter;
//! use colloquy::analysis::token_filter::lowercase::LowercaseFilter;
//! use colloquy::analysis::token::Token;
//!
//! let filter = LowercaseFilter::new();
//! let tokens = vec![Token::new("Hello", 0), Token::new("WORLD", 1)];
//! let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(filtered[0].text, "hello");
//! assert_eq!(filtered[1].text, "world");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod ignore;
pub mod lowercase;
pub mod stem;

pub use ignore::IgnoreFilter;
pub use lowercase::LowercaseFilter;
pub use stem::StemFilter;
