//! Text analysis for Colloquy.
//!
//! Turns raw utterances into the normalized lemmas that index the feature
//! vector. The same pipeline runs when the vocabulary is built, when training
//! examples are encoded and when user input is classified, so any change to it
//! changes the meaning of a trained model.
//!
//! ```text
//! Raw Text → Tokenizer → IgnoreFilter → LowercaseFilter → StemFilter → lemmas
//! ```

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, AnalyzerConfig, IntentAnalyzer, PipelineAnalyzer};
pub use token::{Token, TokenStream};
