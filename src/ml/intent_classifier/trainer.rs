//! Supervised training of the intent network.

use std::time::Instant;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{ColloquyError, Result};
use crate::ml::models::TrainingStats;
use crate::ml::network::{LayerSpec, OptimizerConfig, Sequential};

use super::config::TrainerConfig;
use super::encoder::encode_documents;
use super::types::{Document, TrainingExample};
use super::vocabulary::{TagList, Vocabulary};

/// Fits a [`Sequential`] network to bag-of-words examples.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
    hidden_layers: Vec<LayerSpec>,
}

impl Trainer {
    /// Validate the settings and create a trainer.
    pub fn new(config: TrainerConfig, hidden_layers: Vec<LayerSpec>) -> Result<Self> {
        config.validate()?;
        LayerSpec::validate_all(&hidden_layers)?;
        Ok(Trainer {
            config,
            hidden_layers,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Replace the optimizer for subsequent fits.
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Result<Self> {
        optimizer.validate()?;
        self.config.optimizer = optimizer;
        Ok(self)
    }

    pub fn with_epochs(mut self, epochs: usize) -> Result<Self> {
        if epochs == 0 {
            return Err(ColloquyError::configuration("epochs must be positive"));
        }
        self.config.epochs = epochs;
        Ok(self)
    }

    /// A fresh RNG: seeded when configured, entropy-seeded otherwise.
    pub fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Encode `documents` and train a new network on them.
    pub fn fit(
        &self,
        documents: &[Document],
        vocabulary: &Vocabulary,
        tags: &TagList,
    ) -> Result<(Sequential, TrainingStats)> {
        if documents.is_empty() {
            return Err(ColloquyError::configuration("no training documents"));
        }
        if vocabulary.is_empty() {
            return Err(ColloquyError::configuration("vocabulary is empty"));
        }
        if tags.is_empty() {
            return Err(ColloquyError::configuration("tag list is empty"));
        }

        let examples = encode_documents(documents, vocabulary, tags)?;
        let mut rng = self.rng();
        self.fit_examples(examples, vocabulary.len(), tags.len(), &mut rng)
    }

    fn fit_examples(
        &self,
        mut examples: Vec<TrainingExample>,
        input_dim: usize,
        output_dim: usize,
        rng: &mut StdRng,
    ) -> Result<(Sequential, TrainingStats)> {
        let started = Instant::now();
        let mut network = Sequential::build(input_dim, &self.hidden_layers, output_dim, rng)?;
        let mut optimizer = self.config.optimizer.build()?;
        let mut stats = TrainingStats::new(examples.len());

        info!(
            "Training on {} examples: {} inputs, {} classes, {} parameters, {} epochs, optimizer {}",
            examples.len(),
            input_dim,
            output_dim,
            network.parameter_count(),
            self.config.epochs,
            optimizer.name()
        );

        examples.shuffle(rng);
        for epoch in 0..self.config.epochs {
            if self.config.shuffle_each_epoch && epoch > 0 {
                examples.shuffle(rng);
            }

            let mut loss = 0.0f64;
            let mut correct = 0usize;
            for chunk in examples.chunks(self.config.batch_size) {
                let batch: Vec<(&[f32], &[f32])> = chunk
                    .iter()
                    .map(|ex| (ex.features.as_slice(), ex.label.as_slice()))
                    .collect();
                let outcome = network.train_batch(&batch, optimizer.as_mut(), rng)?;
                loss += outcome.loss as f64;
                correct += outcome.correct;
            }

            let n = examples.len() as f64;
            stats.record_epoch(loss / n, correct as f64 / n);
            debug!(
                "epoch {}/{}: loss {:.4}, accuracy {:.3}",
                epoch + 1,
                self.config.epochs,
                stats.final_loss,
                stats.final_accuracy
            );
        }

        stats.training_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "Training finished in {} ms: loss {:.4}, accuracy {:.3}",
            stats.training_time_ms, stats.final_loss, stats.final_accuracy
        );

        Ok((network, stats))
    }
}
