use crate::{
    loss::cross_entropy::CrossEntropyLoss,
    network::params::{Gradients, NetworkParameters},
};

/// Intermediate values of one forward pass, kept for the matching backward
/// pass. One cache per example; never shared between examples.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardCache {
    /// Hidden pre-activation `x · W1 + b1`.
    pub hidden_pre: Vec<f64>,
    /// Hidden activation `relu(hidden_pre)`.
    pub hidden: Vec<f64>,
    /// Output pre-activation `hidden · W2 + b2`.
    pub output_pre: Vec<f64>,
    /// Softmax probabilities.
    pub output: Vec<f64>,
}

/// Forward pass for a single feature vector. Reads `params`, never mutates.
///
/// # Panics
/// Panics if `input` does not have the network's input length. Callers check
/// the length first; `Network::forward` reports it as `InputSize`.
pub(crate) fn forward(params: &NetworkParameters, input: &[f64]) -> ForwardCache {
    assert_eq!(
        input.len(),
        params.hidden.input_size(),
        "input length must match the network's input size"
    );
    let (hidden_pre, hidden) = params.hidden.feed(input);
    let (output_pre, output) = params.output.feed(&hidden);
    ForwardCache { hidden_pre, hidden, output_pre, output }
}

/// Backpropagation for softmax + cross-entropy.
///
/// `target` is a one-hot vector; `batch_size` scales the output delta. The
/// result depends only on the arguments, so distinct examples can be
/// processed concurrently.
pub fn backward(
    params: &NetworkParameters,
    cache: &ForwardCache,
    input: &[f64],
    target: &[f64],
    batch_size: usize,
) -> Gradients {
    let mut grads = Gradients::zeros_like(params);
    backward_into(params, cache, input, target, batch_size, &mut grads);
    grads
}

/// Same as `backward`, but adds the example's gradients into `acc` instead
/// of allocating a fresh set.
pub fn backward_into(
    params: &NetworkParameters,
    cache: &ForwardCache,
    input: &[f64],
    target: &[f64],
    batch_size: usize,
    acc: &mut Gradients,
) {
    let output_delta = CrossEntropyLoss::derivative(&cache.output, target, batch_size);

    let hidden_error = params.output.weights.mul_vec(&output_delta);
    let hidden_delta: Vec<f64> = hidden_error
        .iter()
        .zip(&cache.hidden_pre)
        .map(|(e, &z)| e * params.hidden.activator.derivative(z))
        .collect();

    acc.output.add_example(&cache.hidden, &output_delta);
    acc.hidden.add_example(input, &hidden_delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activation::activation::ActivationFunction,
        layers::dense::Layer,
        loss::cross_entropy::one_hot,
        math::matrix::Matrix,
        network::spec::Architecture,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn fixed_params() -> NetworkParameters {
        let w1 = Matrix::from_rows(vec![vec![0.5, -0.4], vec![0.3, 0.8], vec![-0.2, 0.1]]).unwrap();
        let w2 = Matrix::from_rows(vec![vec![1.0, -1.0], vec![0.25, 0.5]]).unwrap();
        NetworkParameters {
            hidden: Layer::from_parts(w1, vec![0.1, -0.5], ActivationFunction::ReLU).unwrap(),
            output: Layer::from_parts(w2, vec![0.0, 0.2], ActivationFunction::Softmax).unwrap(),
            learning_rate: 0.1,
        }
    }

    fn loss_at(params: &NetworkParameters, input: &[f64], target: &[f64]) -> f64 {
        CrossEntropyLoss::loss(&forward(params, input).output, target)
    }

    #[test]
    fn forward_caches_every_stage() {
        let params = fixed_params();
        let cache = forward(&params, &[1.0, 0.5, 0.0]);
        let expected_pre = [0.1 + 0.5 + 0.15, -0.5 - 0.4 + 0.4];
        for (got, want) in cache.hidden_pre.iter().zip(expected_pre) {
            assert!((got - want).abs() < 1e-12);
        }
        assert!((cache.hidden[0] - 0.75).abs() < 1e-12);
        assert_eq!(cache.hidden[1], 0.0);
        let sum: f64 = cache.output.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn backward_matches_finite_differences() {
        let params = fixed_params();
        let input = [0.9, 0.2, 0.6];
        let target = one_hot(1, 2);
        let cache = forward(&params, &input);
        let grads = backward(&params, &cache, &input, &target, 1);

        let h = 1e-6;
        for r in 0..2 {
            for c in 0..2 {
                let mut plus = params.clone();
                plus.output.weights.set(r, c, params.output.weights.get(r, c) + h);
                let mut minus = params.clone();
                minus.output.weights.set(r, c, params.output.weights.get(r, c) - h);
                let numeric = (loss_at(&plus, &input, &target) - loss_at(&minus, &input, &target)) / (2.0 * h);
                assert!((numeric - grads.output.weights.get(r, c)).abs() < 1e-6);
            }
        }
        for r in 0..3 {
            for c in 0..2 {
                let mut plus = params.clone();
                plus.hidden.weights.set(r, c, params.hidden.weights.get(r, c) + h);
                let mut minus = params.clone();
                minus.hidden.weights.set(r, c, params.hidden.weights.get(r, c) - h);
                let numeric = (loss_at(&plus, &input, &target) - loss_at(&minus, &input, &target)) / (2.0 * h);
                assert!((numeric - grads.hidden.weights.get(r, c)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn full_output_gradient_is_not_triangular() {
        let params = fixed_params();
        let input = [0.0, 1.0, 1.0];
        let cache = forward(&params, &input);
        let grads = backward(&params, &cache, &input, &one_hot(0, 2), 1);
        // Row 1 / column 0 lies below the diagonal and must still be updated.
        assert!(cache.hidden[1] > 0.0);
        assert_ne!(grads.output.weights.get(1, 0), 0.0);
    }

    #[test]
    fn batch_size_scales_gradients() {
        let params = fixed_params();
        let input = [0.3, 0.3, 0.3];
        let cache = forward(&params, &input);
        let one = backward(&params, &cache, &input, &one_hot(0, 2), 1);
        let four = backward(&params, &cache, &input, &one_hot(0, 2), 4);
        for (a, b) in one.output.biases.iter().zip(&four.output.biases) {
            assert!((a / 4.0 - b).abs() < 1e-15);
        }
    }

    #[test]
    fn forward_backward_is_bit_deterministic() {
        let arch = Architecture::new(8, 5, 3);
        let params = NetworkParameters::initialize(arch, 0.1, &mut StdRng::seed_from_u64(42)).unwrap();
        let input: Vec<f64> = (0..8).map(|i| i as f64 / 8.0).collect();
        let target = one_hot(2, 3);

        let run = || {
            let cache = forward(&params, &input);
            backward(&params, &cache, &input, &target, 1)
        };
        let first = run();
        let second = run();
        assert_eq!(first.hidden.weights.as_slice(), second.hidden.weights.as_slice());
        assert_eq!(first.output.weights.as_slice(), second.output.weights.as_slice());
        assert_eq!(first, second);
    }
}
