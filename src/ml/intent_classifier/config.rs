//! Engine and trainer configuration.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzerConfig;
use crate::error::{ColloquyError, Result};
use crate::ml::network::{LayerSpec, OptimizerConfig};

/// Name under which models are saved when none is configured.
pub const DEFAULT_MODEL_NAME: &str = "basic_model";

/// Training hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Number of passes over the training examples.
    pub epochs: usize,
    /// Examples per gradient update.
    pub batch_size: usize,
    pub optimizer: OptimizerConfig,
    /// Seed for shuffling, weight initialization, dropout and response
    /// sampling. Entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Reshuffle the examples before every epoch, not only once.
    pub shuffle_each_epoch: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            epochs: 200,
            batch_size: 5,
            optimizer: OptimizerConfig::default(),
            seed: None,
            shuffle_each_epoch: true,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ColloquyError::configuration("epochs must be positive"));
        }
        if self.batch_size == 0 {
            return Err(ColloquyError::configuration("batch size must be positive"));
        }
        self.optimizer.validate()
    }
}

/// Configuration of an [`IntentEngine`](super::IntentEngine).
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base name of the persisted artifacts.
    pub model_name: String,
    /// Directory holding the artifacts.
    pub model_dir: PathBuf,
    /// Hidden layers; the default stack is used when absent.
    pub hidden_layers: Option<Vec<LayerSpec>>,
    pub analyzer: AnalyzerConfig,
    pub trainer: TrainerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_dir: PathBuf::from("."),
            hidden_layers: None,
            analyzer: AnalyzerConfig::default(),
            trainer: TrainerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                ColloquyError::not_found(format!("config file {}", path.display()))
            }
            _ => ColloquyError::Io(e),
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| ColloquyError::configuration(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_hidden_layers(mut self, layers: Vec<LayerSpec>) -> Self {
        self.hidden_layers = Some(layers);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.trainer.seed = Some(seed);
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.trainer.epochs = epochs;
        self
    }

    /// The configured hidden layers, or the default stack.
    pub fn hidden_layers(&self) -> Vec<LayerSpec> {
        self.hidden_layers
            .clone()
            .unwrap_or_else(LayerSpec::default_hidden)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_name.is_empty()
            || self.model_name.contains(['/', '\\'])
            || self.model_name == "."
            || self.model_name == ".."
        {
            return Err(ColloquyError::configuration(format!(
                "invalid model name '{}'",
                self.model_name
            )));
        }
        if let Some(layers) = &self.hidden_layers {
            LayerSpec::validate_all(layers)?;
        }
        self.trainer.validate()
    }
}
