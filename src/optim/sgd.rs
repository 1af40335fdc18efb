use crate::layers::dense::{Layer, LayerGradients};

/// Plain gradient descent.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update to a layer from gradients summed over `batch_size`
    /// examples: `param -= learning_rate * (grad / batch_size)`.
    pub fn step(&self, layer: &mut Layer, grads: &LayerGradients, batch_size: usize) {
        layer.apply_gradients(grads, self.learning_rate / batch_size.max(1) as f64);
    }
}
