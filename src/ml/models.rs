//! Training statistics and model metadata shared by the classifiers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-epoch history of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Mean cross-entropy loss of each epoch.
    pub losses: Vec<f64>,
    /// Training-set accuracy of each epoch.
    pub accuracies: Vec<f64>,
    /// Number of epochs completed.
    pub epochs: usize,
    /// Number of training examples per epoch.
    pub examples: usize,
    /// Wall-clock training time in milliseconds.
    pub training_time_ms: u64,
    /// Loss of the last epoch.
    pub final_loss: f64,
    /// Accuracy of the last epoch.
    pub final_accuracy: f64,
}

impl TrainingStats {
    pub fn new(examples: usize) -> Self {
        TrainingStats {
            examples,
            ..Default::default()
        }
    }

    /// Record the outcome of one epoch.
    pub fn record_epoch(&mut self, loss: f64, accuracy: f64) {
        self.losses.push(loss);
        self.accuracies.push(accuracy);
        self.epochs += 1;
        self.final_loss = loss;
        self.final_accuracy = accuracy;
    }
}

/// Model metadata for tracking model information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name/identifier.
    pub name: String,
    /// Version of the library that trained the model.
    pub version: String,
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Input width of the network.
    pub vocabulary_size: usize,
    /// Output width of the network.
    pub tag_count: usize,
    /// Name of the optimizer used.
    pub optimizer: String,
    /// Model hyperparameters.
    pub hyperparameters: HashMap<String, f64>,
}

impl ModelMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        ModelMetadata {
            name: name.into(),
            version: crate::VERSION.to_string(),
            trained_at: Utc::now(),
            training_examples: 0,
            vocabulary_size: 0,
            tag_count: 0,
            optimizer: String::new(),
            hyperparameters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_epoch() {
        let mut stats = TrainingStats::new(12);
        stats.record_epoch(1.2, 0.25);
        stats.record_epoch(0.4, 0.75);

        assert_eq!(stats.epochs, 2);
        assert_eq!(stats.examples, 12);
        assert_eq!(stats.losses, vec![1.2, 0.4]);
        assert_eq!(stats.final_loss, 0.4);
        assert_eq!(stats.final_accuracy, 0.75);
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = ModelMetadata::new("basic_model");
        assert_eq!(metadata.name, "basic_model");
        assert_eq!(metadata.version, crate::VERSION);
        assert!(metadata.hyperparameters.is_empty());
    }
}
