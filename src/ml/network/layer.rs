//! Layer specifications and the layers built from them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};

/// Element-wise (or, for softmax, vector-wise) activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
    /// Normalizes the layer output into a probability distribution. Only
    /// valid on the output layer.
    Softmax,
}

impl Activation {
    /// Apply the activation in place.
    pub fn apply(self, values: &mut [f32]) {
        match self {
            Activation::Relu => values.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Sigmoid => values
                .iter_mut()
                .for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
            Activation::Tanh => values.iter_mut().for_each(|v| *v = v.tanh()),
            Activation::Linear => {}
            Activation::Softmax => softmax(values),
        }
    }

    /// Derivative with respect to the pre-activation value.
    ///
    /// `pre` is the input of the activation and `out` its output. Softmax is
    /// handled jointly with the cross-entropy loss and never reaches here.
    pub fn derivative(self, pre: f32, out: f32) -> f32 {
        match self {
            Activation::Relu => {
                if pre > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => out * (1.0 - out),
            Activation::Tanh => 1.0 - out * out,
            Activation::Linear | Activation::Softmax => 1.0,
        }
    }
}

/// Numerically stable softmax.
pub fn softmax(values: &mut [f32]) {
    if values.is_empty() {
        return;
    }
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        values.iter_mut().for_each(|v| *v /= sum);
    }
}

fn default_activation() -> Activation {
    Activation::Relu
}

/// Declarative description of a hidden layer.
///
/// Decoded from configuration as e.g. `{"type": "dense", "units": 64}` or
/// `{"type": "dropout", "rate": 0.5}`; any other `type` is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        units: usize,
        #[serde(default = "default_activation")]
        activation: Activation,
    },
    Dropout {
        rate: f32,
    },
}

impl LayerSpec {
    pub fn dense(units: usize, activation: Activation) -> Self {
        LayerSpec::Dense { units, activation }
    }

    pub fn dropout(rate: f32) -> Self {
        LayerSpec::Dropout { rate }
    }

    /// `Dense(128, relu) → Dropout(0.5) → Dense(64, relu) → Dropout(0.5)`.
    pub fn default_hidden() -> Vec<LayerSpec> {
        vec![
            LayerSpec::dense(128, Activation::Relu),
            LayerSpec::dropout(0.5),
            LayerSpec::dense(64, Activation::Relu),
            LayerSpec::dropout(0.5),
        ]
    }

    /// Check that this is a usable hidden layer.
    pub fn validate(&self) -> Result<()> {
        match self {
            LayerSpec::Dense { units, activation } => {
                if *units == 0 {
                    return Err(ColloquyError::configuration(
                        "dense layer must have at least one unit",
                    ));
                }
                if *activation == Activation::Softmax {
                    return Err(ColloquyError::configuration(
                        "softmax is reserved for the output layer",
                    ));
                }
                Ok(())
            }
            LayerSpec::Dropout { rate } => {
                if !rate.is_finite() || *rate < 0.0 || *rate >= 1.0 {
                    return Err(ColloquyError::configuration(format!(
                        "dropout rate must be in [0, 1), got {rate}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Validate every spec of a list, reporting the offending position.
    pub fn validate_all(specs: &[LayerSpec]) -> Result<()> {
        for (i, spec) in specs.iter().enumerate() {
            spec.validate().map_err(|e| match e {
                ColloquyError::Configuration(msg) => {
                    ColloquyError::configuration(format!("hidden layer {i}: {msg}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

/// Gradients accumulated for one dense layer.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

impl DenseGradients {
    fn zeros(input_dim: usize, units: usize) -> Self {
        DenseGradients {
            weights: vec![0.0; input_dim * units],
            biases: vec![0.0; units],
        }
    }

    pub fn scale(&mut self, factor: f32) {
        self.weights.iter_mut().for_each(|g| *g *= factor);
        self.biases.iter_mut().for_each(|g| *g *= factor);
    }
}

/// Fully connected layer. Weights are stored row-major, one row per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    input_dim: usize,
    units: usize,
    activation: Activation,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl DenseLayer {
    /// Create a layer with Glorot-uniform weights and zero biases.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        units: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (input_dim + units).max(1) as f32).sqrt();
        let weights = (0..input_dim * units)
            .map(|_| rng.random_range(-limit..=limit))
            .collect();

        DenseLayer {
            input_dim,
            units,
            activation,
            weights,
            biases: vec![0.0; units],
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Check that the parameter buffers match the declared shape.
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 || self.units == 0 {
            return Err(ColloquyError::configuration(format!(
                "dense layer has shape {}x{}",
                self.input_dim, self.units
            )));
        }
        if self.weights.len() != self.input_dim * self.units {
            return Err(ColloquyError::configuration(format!(
                "dense layer {}x{} has {} weights, expected {}",
                self.input_dim,
                self.units,
                self.weights.len(),
                self.input_dim * self.units
            )));
        }
        if self.biases.len() != self.units {
            return Err(ColloquyError::configuration(format!(
                "dense layer with {} units has {} biases",
                self.units,
                self.biases.len()
            )));
        }
        if !self.weights.iter().chain(&self.biases).all(|p| p.is_finite()) {
            return Err(ColloquyError::configuration(
                "dense layer has non-finite parameters",
            ));
        }
        Ok(())
    }

    pub(crate) fn zero_gradients(&self) -> DenseGradients {
        DenseGradients::zeros(self.input_dim, self.units)
    }

    pub(crate) fn parameters_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.weights, &mut self.biases)
    }

    /// Returns `(pre_activation, output)`.
    pub fn forward(&self, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let mut pre = self.biases.clone();
        for (unit, z) in pre.iter_mut().enumerate() {
            let row = &self.weights[unit * self.input_dim..(unit + 1) * self.input_dim];
            *z += row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
        }
        let mut out = pre.clone();
        self.activation.apply(&mut out);
        (pre, out)
    }

    /// Accumulate parameter gradients for one sample and return the gradient
    /// with respect to the layer input.
    pub fn backward(
        &self,
        input: &[f32],
        grad_pre: &[f32],
        grads: &mut DenseGradients,
    ) -> Vec<f32> {
        let mut grad_input = vec![0.0; self.input_dim];
        for (unit, &delta) in grad_pre.iter().enumerate() {
            if delta == 0.0 {
                continue;
            }
            let offset = unit * self.input_dim;
            grads.biases[unit] += delta;
            for k in 0..self.input_dim {
                grads.weights[offset + k] += delta * input[k];
                grad_input[k] += self.weights[offset + k] * delta;
            }
        }
        grad_input
    }
}

/// Inverted dropout: active only while training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropoutLayer {
    rate: f32,
}

impl DropoutLayer {
    pub fn new(rate: f32) -> Self {
        DropoutLayer { rate }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn validate(&self) -> Result<()> {
        LayerSpec::dropout(self.rate).validate()
    }

    /// Sample a mask of kept units, scaled by `1 / (1 - rate)`.
    pub fn sample_mask<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<f32> {
        if self.rate <= 0.0 {
            return vec![1.0; len];
        }
        let keep = 1.0 - self.rate;
        (0..len)
            .map(|_| {
                if rng.random::<f32>() < keep {
                    1.0 / keep
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// A built layer of a [`Sequential`](super::Sequential) network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Dense(DenseLayer),
    Dropout(DropoutLayer),
}
