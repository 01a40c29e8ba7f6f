//! Analyzers combine a tokenizer with a chain of token filters.
//!
//! - [`PipelineAnalyzer`] - any tokenizer plus any filters, in order
//! - [`IntentAnalyzer`] - the pipeline used for intent classification, built
//!   from a serializable [`AnalyzerConfig`]

mod intent;
mod pipeline;

pub use intent::{AnalyzerConfig, IntentAnalyzer, StemmerKind, TokenizerConfig};
pub use pipeline::PipelineAnalyzer;

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// # Examples
///
/// ```
/// use colloquy::analysis::analyzer::{Analyzer, IntentAnalyzer};
///
/// let analyzer = IntentAnalyzer::new();
/// let tokens: Vec<_> = analyzer.analyze("Hello World!").unwrap().collect();
///
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[0].text, "hello");
/// assert_eq!(tokens[1].text, "world");
/// ```
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}
