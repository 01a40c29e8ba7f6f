//! Machine learning for Colloquy.
//!
//! - [`network`]: dense/dropout layers, softmax output, optimizers
//! - [`models`]: training statistics and model metadata
//! - [`intent_classifier`]: corpus handling, training, persistence and the
//!   intent engine built on the two above

pub mod intent_classifier;
pub mod models;
pub mod network;

pub use models::{ModelMetadata, TrainingStats};
