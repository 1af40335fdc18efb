/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
pub const EPS: f64 = 1e-10;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    ///
    /// `predicted`: softmax probabilities, shape [n_classes]
    /// `expected` : one-hot target distribution, shape [n_classes]
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits, scaled by the batch size:
    ///   ∂L/∂z_i = (predicted[i] - expected[i]) / batch_size
    pub fn derivative(predicted: &[f64], expected: &[f64], batch_size: usize) -> Vec<f64> {
        let scale = batch_size.max(1) as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| (p - e) / scale)
            .collect()
    }
}

/// One-hot encoding of `label` over `n_classes` classes.
pub fn one_hot(label: usize, n_classes: usize) -> Vec<f64> {
    let mut target = vec![0.0; n_classes];
    target[label] = 1.0;
    target
}
