use rayon::prelude::*;

use crate::{
    data::sample::Sample,
    error::{NetError, Result},
    loss::cross_entropy::{one_hot, CrossEntropyLoss},
    network::{
        network::Network,
        params::{Gradients, NetworkParameters},
        propagation,
    },
};

/// Gradients and loss summed over the examples of one batch.
#[derive(Debug, Clone)]
pub struct BatchSum {
    pub gradients: Gradients,
    pub loss_sum: f64,
    pub count: usize,
}

impl BatchSum {
    fn empty(params: &NetworkParameters) -> Self {
        BatchSum {
            gradients: Gradients::zeros_like(params),
            loss_sum: 0.0,
            count: 0,
        }
    }

    fn add_example(mut self, params: &NetworkParameters, sample: &Sample) -> Self {
        let cache = propagation::forward(params, &sample.features);
        let target = one_hot(sample.label, params.output.size());
        // Unscaled per-example gradients; the store divides by the batch size.
        propagation::backward_into(params, &cache, &sample.features, &target, 1, &mut self.gradients);
        self.loss_sum += CrossEntropyLoss::loss(&cache.output, &target);
        self.count += 1;
        self
    }

    /// Combines two partial sums.
    pub fn merge(mut self, other: BatchSum) -> Self {
        self.gradients.accumulate(&other.gradients);
        self.loss_sum += other.loss_sum;
        self.count += other.count;
        self
    }

    pub fn mean_loss(&self) -> f64 {
        self.loss_sum / self.count.max(1) as f64
    }
}

/// Runs forward + backward for every example of `batch` on the rayon pool.
///
/// Each worker folds its examples into a local `BatchSum`; the partial sums
/// are then reduced pairwise, so no accumulator is ever written by two
/// threads.
pub fn accumulate_batch(params: &NetworkParameters, batch: &[&Sample]) -> BatchSum {
    batch
        .par_iter()
        .fold(|| BatchSum::empty(params), |acc, sample| acc.add_example(params, sample))
        .reduce(|| BatchSum::empty(params), BatchSum::merge)
}

/// Single-threaded equivalent of `accumulate_batch`.
pub fn accumulate_sequential(params: &NetworkParameters, batch: &[&Sample]) -> BatchSum {
    batch
        .iter()
        .fold(BatchSum::empty(params), |acc, sample| acc.add_example(params, sample))
}

/// Trains on one batch and applies exactly one parameter update.
///
/// The read guard is held while the workers run and released before the
/// update takes the write guard. `epoch` and `batch_index` only feed error
/// messages.
///
/// # Returns
/// The batch's mean per-example loss.
pub fn train_batch(network: &Network, batch: &[&Sample], epoch: usize, batch_index: usize) -> Result<f64> {
    let sum = {
        let params = network.store().read();
        accumulate_batch(&params, batch)
    };

    let mean_loss = sum.mean_loss();
    if !mean_loss.is_finite() {
        return Err(NetError::NumericInstability {
            epoch,
            batch: batch_index,
            reason: format!("batch loss is {}", mean_loss),
        });
    }

    network
        .apply_gradients(&sum.gradients, sum.count)
        .map_err(|_| NetError::NumericInstability {
            epoch,
            batch: batch_index,
            reason: "update would produce non-finite parameters".into(),
        })?;

    Ok(mean_loss)
}
