use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};

/// Shape of a one-hidden-layer network.
///
/// Fields:
/// - `input_size` : length of each feature vector (pixel count)
/// - `hidden_size`: number of ReLU units in the hidden layer
/// - `output_size`: number of classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Architecture {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl Architecture {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        Architecture { input_size, hidden_size, output_size }
    }

    /// 28×28 digits, 128 hidden units, 10 classes.
    pub fn mnist() -> Self {
        Architecture::new(784, 128, 10)
    }

    /// Rejects degenerate shapes. A zero-width hidden layer cannot carry any
    /// signal, so it is refused rather than silently producing a constant
    /// output.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(NetError::InvalidArchitecture("input_size must be at least 1".into()));
        }
        if self.hidden_size == 0 {
            return Err(NetError::InvalidArchitecture("hidden_size must be at least 1".into()));
        }
        if self.output_size < 2 {
            return Err(NetError::InvalidArchitecture(format!(
                "output_size must be at least 2, got {}",
                self.output_size
            )));
        }
        Ok(())
    }
}

/// Returns a description of the problem if `learning_rate` is not a usable
/// step size. Zero, negative and non-finite rates are refused.
pub fn learning_rate_problem(learning_rate: f64) -> Option<String> {
    if learning_rate.is_finite() && learning_rate > 0.0 {
        None
    } else {
        Some(format!("learning rate must be positive and finite, got {}", learning_rate))
    }
}

/// Training hyperparameters kept separate from the architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperparams {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    /// Number of held-out samples evaluated after each epoch.
    pub eval_limit: usize,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Hyperparams {
            learning_rate: 0.01,
            batch_size: 32,
            epochs: 10,
            eval_limit: 1000,
        }
    }
}
