//! A small feed-forward neural network.
//!
//! [`Sequential`] stacks dense and dropout layers and always ends in a dense
//! softmax layer, so its output is a probability distribution over classes.
//! Training minimizes categorical cross-entropy; the gradient of the loss
//! with respect to the output pre-activation is simply `p - y`.

pub mod layer;
pub mod optimizer;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};

pub use layer::{Activation, DenseLayer, DropoutLayer, Layer, LayerSpec};
pub use optimizer::{Adam, Optimizer, OptimizerConfig, Sgd};

use layer::DenseGradients;

const PROBABILITY_FLOOR: f32 = 1e-7;

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] || (values[best].is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    Some(best)
}

/// Categorical cross-entropy of `probabilities` against a one-hot `target`.
pub fn cross_entropy(probabilities: &[f32], target: &[f32]) -> f32 {
    probabilities
        .iter()
        .zip(target)
        .filter(|(_, y)| **y > 0.0)
        .map(|(p, y)| -y * p.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR).ln())
        .sum()
}

/// Loss and hit count of one training batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchOutcome {
    pub loss: f32,
    pub correct: usize,
    pub samples: usize,
}

enum Cache {
    Dense { pre: Vec<f32> },
    Dropout { mask: Vec<f32> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequential {
    input_dim: usize,
    layers: Vec<Layer>,
}

impl Sequential {
    /// Build a network of `hidden` layers followed by a softmax output layer
    /// of `output_dim` units.
    pub fn build<R: Rng + ?Sized>(
        input_dim: usize,
        hidden: &[LayerSpec],
        output_dim: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(ColloquyError::configuration(
                "network input dimension must be positive",
            ));
        }
        if output_dim == 0 {
            return Err(ColloquyError::configuration(
                "network needs at least one output class",
            ));
        }
        LayerSpec::validate_all(hidden)?;

        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut width = input_dim;
        for spec in hidden {
            match *spec {
                LayerSpec::Dense { units, activation } => {
                    layers.push(Layer::Dense(DenseLayer::new(width, units, activation, rng)));
                    width = units;
                }
                LayerSpec::Dropout { rate } => layers.push(Layer::Dropout(DropoutLayer::new(rate))),
            }
        }
        layers.push(Layer::Dense(DenseLayer::new(
            width,
            output_dim,
            Activation::Softmax,
            rng,
        )));

        Ok(Sequential { input_dim, layers })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_layer().map(DenseLayer::units).unwrap_or(0)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| match layer {
                Layer::Dense(dense) => dense.parameter_count(),
                Layer::Dropout(_) => 0,
            })
            .sum()
    }

    fn output_layer(&self) -> Option<&DenseLayer> {
        match self.layers.last() {
            Some(Layer::Dense(dense)) => Some(dense),
            _ => None,
        }
    }

    /// Check the structural invariants of a network that came from outside
    /// (e.g. decoded from disk).
    pub fn validate(&self) -> Result<()> {
        match self.output_layer() {
            Some(out) if out.activation() == Activation::Softmax => {}
            _ => {
                return Err(ColloquyError::configuration(
                    "network must end in a dense softmax layer",
                ));
            }
        }
        let mut width = self.input_dim;
        for (i, layer) in self.layers.iter().enumerate() {
            let checked = match layer {
                Layer::Dense(dense) if dense.input_dim() != width => {
                    Err(ColloquyError::configuration(format!(
                        "expects {} inputs but receives {}",
                        dense.input_dim(),
                        width
                    )))
                }
                Layer::Dense(dense) => {
                    width = dense.units();
                    dense.validate()
                }
                Layer::Dropout(dropout) => dropout.validate(),
            };
            checked.map_err(|e| match e {
                ColloquyError::Configuration(msg) => {
                    ColloquyError::configuration(format!("layer {i}: {msg}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Inference forward pass; dropout is inactive.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.input_dim {
            return Err(ColloquyError::other(format!(
                "expected input of length {}, got {}",
                self.input_dim,
                input.len()
            )));
        }
        let mut current = input.to_vec();
        for layer in &self.layers {
            if let Layer::Dense(dense) = layer {
                current = dense.forward(&current).1;
            }
        }
        Ok(current)
    }

    /// Run one optimization step over a batch of `(features, one_hot)` pairs.
    ///
    /// Gradients are accumulated per sample and averaged before the update.
    pub fn train_batch<R: Rng + ?Sized>(
        &mut self,
        batch: &[(&[f32], &[f32])],
        optimizer: &mut dyn Optimizer,
        rng: &mut R,
    ) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        if batch.is_empty() {
            return Ok(outcome);
        }

        let mut grads: Vec<Option<DenseGradients>> = self
            .layers
            .iter()
            .map(|layer| match layer {
                Layer::Dense(dense) => Some(dense.zero_gradients()),
                Layer::Dropout(_) => None,
            })
            .collect();

        for &(features, target) in batch {
            let (loss, hit) = self.accumulate(features, target, &mut grads, rng)?;
            outcome.loss += loss;
            outcome.samples += 1;
            if hit {
                outcome.correct += 1;
            }
        }

        let scale = 1.0 / batch.len() as f32;
        optimizer.begin_step();
        for (i, (layer, grad)) in self.layers.iter_mut().zip(grads.iter_mut()).enumerate() {
            if let (Layer::Dense(dense), Some(grad)) = (layer, grad) {
                grad.scale(scale);
                let (weights, biases) = dense.parameters_mut();
                optimizer.update(2 * i, weights, &grad.weights);
                optimizer.update(2 * i + 1, biases, &grad.biases);
            }
        }

        Ok(outcome)
    }

    /// Forward and backward pass for one sample. Returns the loss and whether
    /// the arg-max matched the target.
    fn accumulate<R: Rng + ?Sized>(
        &self,
        features: &[f32],
        target: &[f32],
        grads: &mut [Option<DenseGradients>],
        rng: &mut R,
    ) -> Result<(f32, bool)> {
        if features.len() != self.input_dim || target.len() != self.output_dim() {
            return Err(ColloquyError::other(format!(
                "training example has shape ({}, {}), network expects ({}, {})",
                features.len(),
                target.len(),
                self.input_dim,
                self.output_dim()
            )));
        }

        let mut activations: Vec<Vec<f32>> = Vec::with_capacity(self.layers.len() + 1);
        let mut caches = Vec::with_capacity(self.layers.len());
        activations.push(features.to_vec());

        for layer in &self.layers {
            let input = &activations[activations.len() - 1];
            match layer {
                Layer::Dense(dense) => {
                    let (pre, out) = dense.forward(input);
                    caches.push(Cache::Dense { pre });
                    activations.push(out);
                }
                Layer::Dropout(dropout) => {
                    let mask = dropout.sample_mask(input.len(), rng);
                    let out = input.iter().zip(&mask).map(|(a, m)| a * m).collect();
                    caches.push(Cache::Dropout { mask });
                    activations.push(out);
                }
            }
        }

        let probabilities = &activations[activations.len() - 1];
        let loss = cross_entropy(probabilities, target);
        let hit = argmax(probabilities) == argmax(target);

        // Softmax + cross-entropy: dL/dz = p - y at the output layer.
        let mut grad: Vec<f32> = probabilities.iter().zip(target).map(|(p, y)| p - y).collect();
        let mut grad_is_pre_activation = true;

        for (idx, layer) in self.layers.iter().enumerate().rev() {
            match (layer, &caches[idx]) {
                (Layer::Dense(dense), Cache::Dense { pre }) => {
                    let grad_pre = if grad_is_pre_activation {
                        grad
                    } else {
                        let activation = dense.activation();
                        grad.iter()
                            .zip(pre)
                            .zip(&activations[idx + 1])
                            .map(|((g, z), a)| g * activation.derivative(*z, *a))
                            .collect()
                    };
                    let Some(layer_grads) = grads[idx].as_mut() else {
                        return Err(ColloquyError::other("gradient buffer missing for dense layer"));
                    };
                    grad = dense.backward(&activations[idx], &grad_pre, layer_grads);
                    grad_is_pre_activation = false;
                }
                (Layer::Dropout(_), Cache::Dropout { mask }) => {
                    grad.iter_mut().zip(mask).for_each(|(g, m)| *g *= m);
                }
                _ => return Err(ColloquyError::other("layer cache out of sync")),
            }
        }

        Ok((loss, hit))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5, 0.1]), Some(1));
        assert_eq!(argmax(&[0.0, 0.0]), Some(0));
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_cross_entropy() {
        let loss = cross_entropy(&[0.25, 0.75], &[0.0, 1.0]);
        assert!((loss - 0.287_682).abs() < 1e-5);

        // Clamped rather than infinite.
        assert!(cross_entropy(&[1.0, 0.0], &[0.0, 1.0]).is_finite());
    }

    #[test]
    fn test_build_and_predict_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let network = Sequential::build(6, &LayerSpec::default_hidden(), 3, &mut rng).unwrap();

        assert_eq!(network.input_dim(), 6);
        assert_eq!(network.output_dim(), 3);
        assert_eq!(network.layers().len(), 5);
        assert!(network.validate().is_ok());

        let probabilities = network.predict(&[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
        assert_eq!(probabilities.len(), 3);
        assert!(probabilities.iter().all(|p| *p >= 0.0));
        assert!((probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        assert!(network.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_build_rejects_bad_layers() {
        let mut rng = StdRng::seed_from_u64(0);
        let hidden = vec![LayerSpec::dense(0, Activation::Relu)];
        let err = Sequential::build(4, &hidden, 2, &mut rng).unwrap_err();
        assert!(err.is_configuration());

        assert!(Sequential::build(0, &[], 2, &mut rng).is_err());
        assert!(Sequential::build(4, &[], 0, &mut rng).is_err());
    }

    #[test]
    fn test_training_learns_separable_data() {
        let mut rng = StdRng::seed_from_u64(3);
        let hidden = vec![LayerSpec::dense(8, Activation::Relu)];
        let mut network = Sequential::build(3, &hidden, 2, &mut rng).unwrap();
        let mut optimizer = OptimizerConfig::adam(0.05).build().unwrap();

        let data: Vec<(Vec<f32>, Vec<f32>)> = vec![
            (vec![1.0, 0.0, 0.0], vec![1.0, 0.0]),
            (vec![1.0, 1.0, 0.0], vec![1.0, 0.0]),
            (vec![0.0, 0.0, 1.0], vec![0.0, 1.0]),
            (vec![0.0, 1.0, 1.0], vec![0.0, 1.0]),
        ];
        let batch: Vec<(&[f32], &[f32])> = data
            .iter()
            .map(|(x, y)| (x.as_slice(), y.as_slice()))
            .collect();

        let first = network.train_batch(&batch, optimizer.as_mut(), &mut rng).unwrap();
        let mut last = first;
        for _ in 0..200 {
            last = network.train_batch(&batch, optimizer.as_mut(), &mut rng).unwrap();
        }

        assert!(last.loss < first.loss);
        assert_eq!(last.correct, 4);
        for (x, y) in &data {
            let p = network.predict(x).unwrap();
            assert_eq!(argmax(&p), argmax(y));
        }
    }

    #[test]
    fn test_validate_rejects_decoded_damage() {
        let mut rng = StdRng::seed_from_u64(9);
        let network = Sequential::build(3, &LayerSpec::default_hidden(), 2, &mut rng).unwrap();
        let mut value = serde_json::to_value(&network).unwrap();

        let mut short = value.clone();
        short["layers"][0]["Dense"]["weights"] = serde_json::json!([0.1, 0.2]);
        let short: Sequential = serde_json::from_value(short).unwrap();
        let err = short.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("layer 0"));

        value["layers"][1]["Dropout"]["rate"] = serde_json::json!(1.5);
        let bad_rate: Sequential = serde_json::from_value(value).unwrap();
        assert!(bad_rate.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_serde_round_trip_preserves_outputs() {
        let mut rng = StdRng::seed_from_u64(9);
        let network = Sequential::build(4, &LayerSpec::default_hidden(), 2, &mut rng).unwrap();
        let bytes = bincode::serialize(&network).unwrap();
        let restored: Sequential = bincode::deserialize(&bytes).unwrap();

        let input = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(network.predict(&input).unwrap(), restored.predict(&input).unwrap());
    }
}
