use rand::Rng;

use crate::{
    activation::activation::ActivationFunction,
    error::{NetError, Result},
    layers::dense::{Layer, LayerGradients},
    math::matrix::Matrix,
    network::spec::{learning_rate_problem, Architecture},
    optim::sgd::Sgd,
};

/// Weights and biases of both layers plus the learning rate.
///
/// `hidden` holds `weights1 [input × hidden]` / `biases1`, `output` holds
/// `weights2 [hidden × output]` / `biases2`. Shapes never change after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParameters {
    pub hidden: Layer,
    pub output: Layer,
    pub learning_rate: f64,
}

/// Gradients with the same shape as `NetworkParameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub hidden: LayerGradients,
    pub output: LayerGradients,
}

impl NetworkParameters {
    /// He-normal weights (std `sqrt(2 / fan_in)`) and zero biases, drawn from
    /// `rng` so that a fixed seed gives a fixed network.
    pub fn initialize<R: Rng + ?Sized>(
        arch: Architecture,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<Self> {
        arch.validate()?;
        if let Some(problem) = learning_rate_problem(learning_rate) {
            return Err(NetError::InvalidArchitecture(problem));
        }
        let hidden = Layer::new(arch.input_size, arch.hidden_size, ActivationFunction::ReLU, rng);
        let output = Layer::new(arch.hidden_size, arch.output_size, ActivationFunction::Softmax, rng);
        Ok(NetworkParameters { hidden, output, learning_rate })
    }

    pub fn architecture(&self) -> Architecture {
        Architecture::new(self.hidden.input_size(), self.hidden.size(), self.output.size())
    }

    pub fn weights1(&self) -> &Matrix {
        &self.hidden.weights
    }

    pub fn biases1(&self) -> &[f64] {
        &self.hidden.biases
    }

    pub fn weights2(&self) -> &Matrix {
        &self.output.weights
    }

    pub fn biases2(&self) -> &[f64] {
        &self.output.biases
    }

    /// `param -= learning_rate * grad / batch_size` for every weight and bias.
    pub fn apply_gradients(&mut self, grads: &Gradients, batch_size: usize) {
        let sgd = Sgd::new(self.learning_rate);
        sgd.step(&mut self.hidden, &grads.hidden, batch_size);
        sgd.step(&mut self.output, &grads.output, batch_size);
    }

    pub fn is_finite(&self) -> bool {
        self.learning_rate.is_finite() && self.hidden.is_finite() && self.output.is_finite()
    }
}

impl Gradients {
    pub fn zeros_like(params: &NetworkParameters) -> Gradients {
        Gradients {
            hidden: LayerGradients::zeros_like(&params.hidden),
            output: LayerGradients::zeros_like(&params.output),
        }
    }

    /// Adds `other` into `self`.
    pub fn accumulate(&mut self, other: &Gradients) {
        self.hidden.accumulate(&other.hidden);
        self.output.accumulate(&other.output);
    }

    /// Combines two partial sums, consuming both.
    pub fn merge(mut self, other: Gradients) -> Gradients {
        self.accumulate(&other);
        self
    }
}
