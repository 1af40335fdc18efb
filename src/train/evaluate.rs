use rayon::prelude::*;
use serde::Serialize;

use crate::{
    data::sample::Sample,
    error::{NetError, Result},
    loss::cross_entropy::{one_hot, CrossEntropyLoss},
    network::{argmax, network::Network, propagation, spec::Architecture},
};

/// Forward-only measurements over a sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    /// Mean cross-entropy loss.
    pub loss: f64,
    /// Percentage in [0, 100].
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
}

/// Evaluates `network` on the first `limit` samples.
pub fn evaluate(network: &Network, samples: &[Sample], limit: usize) -> Result<Evaluation> {
    let subset = &samples[..samples.len().min(limit)];
    check_samples(network.architecture(), subset, "evaluation")?;
    Ok(evaluate_unchecked(network, subset))
}

/// Evaluation for samples already known to fit the architecture.
pub(crate) fn evaluate_unchecked(network: &Network, samples: &[Sample]) -> Evaluation {
    let total = samples.len();
    if total == 0 {
        return Evaluation { loss: 0.0, accuracy: 0.0, correct: 0, total: 0 };
    }

    let params = network.store().read();
    let n_classes = params.output.size();
    let (loss_sum, correct) = samples
        .par_iter()
        .map(|sample| {
            let output = propagation::forward(&params, &sample.features).output;
            let loss = CrossEntropyLoss::loss(&output, &one_hot(sample.label, n_classes));
            (loss, usize::from(argmax(&output) == sample.label))
        })
        .reduce(|| (0.0, 0), |(la, ca), (lb, cb)| (la + lb, ca + cb));

    Evaluation {
        loss: loss_sum / total as f64,
        accuracy: correct as f64 * 100.0 / total as f64,
        correct,
        total,
    }
}

/// Checks feature length and label range of every sample.
pub(crate) fn check_samples(arch: Architecture, samples: &[Sample], what: &str) -> Result<()> {
    for (i, sample) in samples.iter().enumerate() {
        if sample.features.len() != arch.input_size {
            return Err(NetError::InvalidConfig(format!(
                "{} sample {} has {} features, network expects {}",
                what,
                i,
                sample.features.len(),
                arch.input_size
            )));
        }
        if sample.label >= arch.output_size {
            return Err(NetError::InvalidConfig(format!(
                "{} sample {} has label {}, network has {} classes",
                what, i, sample.label, arch.output_size
            )));
        }
    }
    Ok(())
}
