//! Neural intent classification.
//!
//! A corpus of intents (tag, example patterns, replies) is turned into a
//! bag-of-words training set, a small feed-forward network is fit to it, and
//! [`IntentEngine`] uses the result to answer one utterance at a time.
//!
//! # Architecture
//!
//! - `types`: [`IntentCorpus`], [`Intent`] and training documents
//! - `vocabulary`: [`VocabularyBuilder`] producing the [`Vocabulary`] and [`TagList`]
//! - `encoder`: bag-of-words and one-hot encoding
//! - `trainer`: [`Trainer`] fitting a [`Sequential`](crate::ml::network::Sequential) network
//! - `store`: [`ModelStore`] persisting a [`TrainedModel`] as three artifacts
//! - `action`: [`IntentAction`] callbacks bound to tags
//! - `engine`: [`IntentEngine`], tying it all together
//!
//! # Example
//!
//! ```rust,no_run
//! use colloquy::ml::intent_classifier::{EngineConfig, IntentCorpus, IntentEngine};
//!
//! # fn main() -> colloquy::error::Result<()> {
//! let corpus = IntentCorpus::from_path("intents.json")?;
//! let mut engine = IntentEngine::new(corpus, EngineConfig::default())?
//!     .with_action("bye", || -> anyhow::Result<()> {
//!         println!("shutting down");
//!         Ok(())
//!     });
//!
//! if engine.load().is_err() {
//!     engine.fit()?;
//!     engine.save()?;
//! }
//!
//! println!("{}", engine.ask("hello there")?);
//! # Ok(())
//! # }
//! ```

mod action;
mod classifier;
mod config;
mod encoder;
mod engine;
mod store;
mod trainer;
mod types;
mod vocabulary;

pub use action::{ActionStatus, IntentAction, MethodMapping, run_action};
pub use classifier::IntentClassifier;
pub use config::{DEFAULT_MODEL_NAME, EngineConfig, TrainerConfig};
pub use encoder::{encode, encode_documents, encode_label, encode_text};
pub use engine::{FALLBACK_RESPONSE, IntentEngine, Prediction, Response};
pub use store::{ArtifactKind, ModelStore, TrainedModel};
pub use trainer::Trainer;
pub use types::{Document, Intent, IntentCorpus, TrainingExample};
pub use vocabulary::{BuiltVocabulary, TagList, Vocabulary, VocabularyBuilder};
