use rand::Rng;

use crate::{
    activation::activation::ActivationFunction,
    error::{NetError, Result},
    math::matrix::Matrix,
};

/// Fully connected layer: `a = f(x · W + b)`.
///
/// `weights` has shape `[input_size × size]`, `biases` has length `size`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

/// Gradient of the loss w.r.t. one layer's weights and biases.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

impl Layer {
    /// He-initialized weights, zero biases.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        Layer {
            weights: Matrix::he(input_size, size, rng),
            biases: vec![0.0; size],
            activator: activation,
        }
    }

    pub fn from_parts(weights: Matrix, biases: Vec<f64>, activation: ActivationFunction) -> Result<Layer> {
        if weights.cols != biases.len() {
            return Err(NetError::InvalidModel(format!(
                "layer has {} weight columns but {} biases",
                weights.cols,
                biases.len()
            )));
        }
        Ok(Layer { weights, biases, activator: activation })
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn size(&self) -> usize {
        self.weights.cols
    }

    /// Pre-activation `z = x · W + b`.
    pub fn pre_activation(&self, input: &[f64]) -> Vec<f64> {
        let mut z = self.biases.clone();
        self.weights.vec_mul_into(input, &mut z);
        z
    }

    /// Returns `(z, f(z))`.
    pub fn feed(&self, input: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let z = self.pre_activation(input);
        let mut a = z.clone();
        self.activator.apply(&mut a);
        (z, a)
    }

    /// `W -= scale * dW`, `b -= scale * db`.
    pub fn apply_gradients(&mut self, grads: &LayerGradients, scale: f64) {
        self.weights.sub_scaled(&grads.weights, scale);
        for (b, g) in self.biases.iter_mut().zip(&grads.biases) {
            *b -= scale * g;
        }
    }

    pub fn is_finite(&self) -> bool {
        self.weights.is_finite() && self.biases.iter().all(|b| b.is_finite())
    }
}

impl LayerGradients {
    pub fn zeros_like(layer: &Layer) -> LayerGradients {
        LayerGradients {
            weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            biases: vec![0.0; layer.biases.len()],
        }
    }

    /// Adds one example's gradients: `dW += input^T · delta`, `db += delta`.
    pub fn add_example(&mut self, input: &[f64], delta: &[f64]) {
        self.weights.add_outer(input, delta);
        for (b, d) in self.biases.iter_mut().zip(delta) {
            *b += d;
        }
    }

    pub fn accumulate(&mut self, other: &LayerGradients) {
        self.weights += &other.weights;
        for (a, b) in self.biases.iter_mut().zip(&other.biases) {
            *a += b;
        }
    }
}
