//! The analyzer used by the intent engine.
//!
//! Pipeline: tokenizer → [`IgnoreFilter`] → [`LowercaseFilter`] →
//! [`StemFilter`]. Everything that shapes the pipeline lives in
//! [`AnalyzerConfig`], which is persisted next to the vocabulary so a reloaded
//! model normalizes input exactly as it did at training time.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::ignore::{DEFAULT_IGNORE_TOKENS, IgnoreFilter};
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stem::{
    IdentityStemmer, Lemmatizer, PorterStemmer, StemFilter, Stemmer,
};
use crate::analysis::tokenizer::{RegexTokenizer, Tokenizer, WordTokenizer};
use crate::error::Result;

/// Tokenizer selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenizerConfig {
    /// Unicode word boundaries, punctuation kept as tokens.
    #[default]
    Word,
    /// Every match of `pattern` is a token.
    Regex { pattern: String },
}

/// Normalizer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StemmerKind {
    /// Irregular-form table plus Porter rules.
    #[default]
    Lemma,
    /// Porter rules only.
    Porter,
    /// Lowercasing only.
    Identity,
}

impl StemmerKind {
    fn build(self) -> Box<dyn Stemmer> {
        match self {
            StemmerKind::Lemma => Box::new(Lemmatizer::new()),
            StemmerKind::Porter => Box::new(PorterStemmer::new()),
            StemmerKind::Identity => Box::new(IdentityStemmer::new()),
        }
    }
}

/// Serializable description of an [`IntentAnalyzer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub tokenizer: TokenizerConfig,
    pub stemmer: StemmerKind,
    /// Tokens dropped before normalization.
    pub ignore: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            tokenizer: TokenizerConfig::Word,
            stemmer: StemmerKind::Lemma,
            ignore: DEFAULT_IGNORE_TOKENS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Analyzer producing the lemmas that index bag-of-words vectors.
///
/// # Examples
///
/// ```
/// use colloquy::analysis::analyzer::IntentAnalyzer;
///
/// let analyzer = IntentAnalyzer::new();
/// assert_eq!(analyzer.lemmas("Are you running?").unwrap(), vec!["be", "you", "run"]);
/// assert_eq!(analyzer.normalize("Running"), "run");
/// ```
pub struct IntentAnalyzer {
    inner: PipelineAnalyzer,
    tokenizer: Arc<dyn Tokenizer>,
    stemmer: Box<dyn Stemmer>,
    config: AnalyzerConfig,
}

impl IntentAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        let config = AnalyzerConfig::default();
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(WordTokenizer::new());
        Self::assemble(tokenizer, config)
    }

    /// Create an analyzer from a configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let tokenizer: Arc<dyn Tokenizer> = match &config.tokenizer {
            TokenizerConfig::Word => Arc::new(WordTokenizer::new()),
            TokenizerConfig::Regex { pattern } => Arc::new(RegexTokenizer::with_pattern(pattern)?),
        };
        Ok(Self::assemble(tokenizer, config.clone()))
    }

    fn assemble(tokenizer: Arc<dyn Tokenizer>, config: AnalyzerConfig) -> Self {
        let inner = PipelineAnalyzer::new(Arc::clone(&tokenizer))
            .add_filter(Arc::new(IgnoreFilter::from_tokens(config.ignore.clone())))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StemFilter::with_stemmer(config.stemmer.build())))
            .with_name("intent");

        IntentAnalyzer {
            inner,
            tokenizer,
            stemmer: config.stemmer.build(),
            config,
        }
    }

    /// The configuration this analyzer was built from.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Split text into raw tokens (order and case preserved, nothing dropped).
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.tokenizer.tokenize(text)?.map(|t| t.text).collect())
    }

    /// Lowercase a single token and reduce it to its lemma.
    pub fn normalize(&self, token: &str) -> String {
        self.stemmer.stem(&LowercaseFilter::lowercase(token))
    }

    /// Run the full pipeline and collect the resulting lemmas.
    pub fn lemmas(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|t| t.text).collect())
    }
}

impl Default for IntentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for IntentAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "intent"
    }
}

impl std::fmt::Debug for IntentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentAnalyzer")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline() {
        let analyzer = IntentAnalyzer::new();

        let lemmas = analyzer.lemmas("Hi there, how are you?").unwrap();
        assert_eq!(lemmas, vec!["hi", "there", "how", "be", "you"]);
    }

    #[test]
    fn test_tokenize_keeps_raw_tokens() {
        let analyzer = IntentAnalyzer::new();

        let tokens = analyzer.tokenize("Plot AAPL!").unwrap();
        assert_eq!(tokens, vec!["Plot", "AAPL", "!"]);
    }

    #[test]
    fn test_normalize_matches_pipeline() {
        let analyzer = IntentAnalyzer::new();

        for word in ["Running", "Stocks", "went", "Portfolio"] {
            let via_pipeline = analyzer.lemmas(word).unwrap();
            assert_eq!(via_pipeline, vec![analyzer.normalize(word)]);
        }
    }

    #[test]
    fn test_from_config_with_regex_and_identity() {
        let config = AnalyzerConfig {
            tokenizer: TokenizerConfig::Regex {
                pattern: r"[A-Za-z]+".to_string(),
            },
            stemmer: StemmerKind::Identity,
            ignore: vec![],
        };
        let analyzer = IntentAnalyzer::from_config(&config).unwrap();

        assert_eq!(analyzer.lemmas("Running, 42 Stocks").unwrap(), vec!["running", "stocks"]);
        assert_eq!(analyzer.config(), &config);
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let config = AnalyzerConfig {
            tokenizer: TokenizerConfig::Regex {
                pattern: "[".to_string(),
            },
            ..AnalyzerConfig::default()
        };
        assert!(IntentAnalyzer::from_config(&config).is_err());
    }

    #[test]
    fn test_config_json_round_trip_defaults() {
        let config: AnalyzerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalyzerConfig::default());

        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"tokenizer": {"type": "regex", "pattern": "\\w+"}, "stemmer": "porter"}"#)
                .unwrap();
        assert_eq!(config.stemmer, StemmerKind::Porter);
        assert_eq!(config.ignore.len(), 4);
    }
}
