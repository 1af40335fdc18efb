use serde::{Deserialize, Serialize};

/// Activations used by the network: ReLU on the hidden layer, softmax on the
/// output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    /// Softmax is a vector-valued activation; it is applied to the whole
    /// output vector by `softmax()`, never element-wise.
    Softmax,
}

impl ActivationFunction {
    /// Applies the activation to `z` in place.
    pub fn apply(&self, z: &mut [f64]) {
        match self {
            ActivationFunction::ReLU => z.iter_mut().for_each(|x| *x = relu(*x)),
            ActivationFunction::Softmax => softmax_in_place(z),
        }
    }

    /// Element-wise derivative evaluated at the pre-activation `x`.
    ///
    /// For `Softmax` the derivative is folded into the cross-entropy gradient
    /// (`predicted - expected`), so `1.0` passes that delta through unchanged.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => relu_derivative(x),
            ActivationFunction::Softmax => 1.0,
        }
    }
}

pub fn relu(x: f64) -> f64 {
    if x > 0.0 { x } else { 0.0 }
}

pub fn relu_derivative(x: f64) -> f64 {
    if x > 0.0 { 1.0 } else { 0.0 }
}

/// Numerically stable softmax: `exp(x_i - max(x)) / sum_j exp(x_j - max(x))`.
///
/// Entries are clamped into `[f64::MIN_POSITIVE, 1 - f64::EPSILON]`, so every
/// probability stays strictly inside (0, 1) even when `exp` underflows.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let mut out = logits.to_vec();
    softmax_in_place(&mut out);
    out
}

fn softmax_in_place(z: &mut [f64]) {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for x in z.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in z.iter_mut() {
        *x = (*x / sum).clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
    }
}
