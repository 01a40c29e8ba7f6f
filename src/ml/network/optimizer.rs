//! Gradient-descent optimizers.
//!
//! An optimizer owns per-parameter state (moments, velocities) keyed by a
//! slot number. [`Sequential`](super::Sequential) assigns two slots per dense
//! layer, one for the weight matrix and one for the bias vector.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};

/// Serializable optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Adam {
        learning_rate: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    Sgd {
        learning_rate: f32,
        #[serde(default)]
        momentum: f32,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::adam(0.01)
    }
}

impl OptimizerConfig {
    /// Adam with the usual moment decay rates.
    pub fn adam(learning_rate: f32) -> Self {
        OptimizerConfig::Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }

    pub fn sgd(learning_rate: f32, momentum: f32) -> Self {
        OptimizerConfig::Sgd {
            learning_rate,
            momentum,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OptimizerConfig::Adam { .. } => "adam",
            OptimizerConfig::Sgd { .. } => "sgd",
        }
    }

    pub fn learning_rate(&self) -> f32 {
        match self {
            OptimizerConfig::Adam { learning_rate, .. }
            | OptimizerConfig::Sgd { learning_rate, .. } => *learning_rate,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lr = self.learning_rate();
        if !lr.is_finite() || lr <= 0.0 {
            return Err(ColloquyError::configuration(format!(
                "learning rate must be positive, got {lr}"
            )));
        }
        match self {
            OptimizerConfig::Adam {
                beta1,
                beta2,
                epsilon,
                ..
            } => {
                for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
                    if !(0.0..1.0).contains(beta) {
                        return Err(ColloquyError::configuration(format!(
                            "{name} must be in [0, 1), got {beta}"
                        )));
                    }
                }
                if *epsilon <= 0.0 {
                    return Err(ColloquyError::configuration("epsilon must be positive"));
                }
            }
            OptimizerConfig::Sgd { momentum, .. } => {
                if !(0.0..1.0).contains(momentum) {
                    return Err(ColloquyError::configuration(format!(
                        "momentum must be in [0, 1), got {momentum}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate and instantiate a fresh optimizer.
    pub fn build(&self) -> Result<Box<dyn Optimizer>> {
        self.validate()?;
        Ok(match *self {
            OptimizerConfig::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(learning_rate, beta1, beta2, epsilon)),
            OptimizerConfig::Sgd {
                learning_rate,
                momentum,
            } => Box::new(Sgd::new(learning_rate, momentum)),
        })
    }
}

/// Updates parameters from their (batch-averaged) gradients.
pub trait Optimizer: Send {
    /// Called once per batch, before any [`Optimizer::update`].
    fn begin_step(&mut self);

    /// Apply one update to the parameters of `slot`.
    fn update(&mut self, slot: usize, params: &mut [f32], grads: &[f32]);

    fn name(&self) -> &'static str;
}

/// Adam with bias-corrected moment estimates.
#[derive(Debug)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step: i32,
    moments: AHashMap<usize, (Vec<f32>, Vec<f32>)>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            step: 0,
            moments: AHashMap::new(),
        }
    }
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.step += 1;
    }

    fn update(&mut self, slot: usize, params: &mut [f32], grads: &[f32]) {
        let (m, v) = self
            .moments
            .entry(slot)
            .or_insert_with(|| (vec![0.0; params.len()], vec![0.0; params.len()]));

        let t = self.step.max(1);
        let correction1 = 1.0 - self.beta1.powi(t);
        let correction2 = 1.0 - self.beta2.powi(t);

        for i in 0..params.len() {
            let g = grads[i];
            m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
            v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;
            let m_hat = m[i] / correction1;
            let v_hat = v[i] / correction2;
            params[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}

/// Stochastic gradient descent with classical momentum.
#[derive(Debug)]
pub struct Sgd {
    learning_rate: f32,
    momentum: f32,
    velocities: AHashMap<usize, Vec<f32>>,
}

impl Sgd {
    pub fn new(learning_rate: f32, momentum: f32) -> Self {
        Sgd {
            learning_rate,
            momentum,
            velocities: AHashMap::new(),
        }
    }
}

impl Optimizer for Sgd {
    fn begin_step(&mut self) {}

    fn update(&mut self, slot: usize, params: &mut [f32], grads: &[f32]) {
        if self.momentum == 0.0 {
            for (p, g) in params.iter_mut().zip(grads) {
                *p -= self.learning_rate * g;
            }
            return;
        }

        let velocity = self
            .velocities
            .entry(slot)
            .or_insert_with(|| vec![0.0; params.len()]);
        for i in 0..params.len() {
            velocity[i] = self.momentum * velocity[i] - self.learning_rate * grads[i];
            params[i] += velocity[i];
        }
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}
