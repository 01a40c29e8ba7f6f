//! # Colloquy
//!
//! A small intent-classification engine for conversational assistants.
//!
//! ## Features
//!
//! - Text analysis pipeline (tokenizers, ignore/lowercase/lemma filters)
//! - Bag-of-words encoding over a vocabulary learned from the corpus
//! - Feed-forward network with dropout, softmax output and Adam/SGD training
//! - Versioned, checksummed model artifacts on pluggable storage backends
//! - Host callbacks bound to intents, isolated from the dispatcher

pub mod analysis;
pub mod cli;
pub mod error;
pub mod ml;
pub mod storage;

pub mod prelude {
    pub use crate::error::{ColloquyError, Result};
    pub use crate::ml::intent_classifier::{
        ActionStatus, EngineConfig, Intent, IntentAction, IntentCorpus, IntentEngine,
        MethodMapping, Prediction, Response,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
