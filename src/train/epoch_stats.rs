use serde::{Deserialize, Serialize};

/// Per-epoch training statistics emitted by `train`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochResult` at the end of every completed epoch, after
/// that epoch's updates and evaluation are done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochResult {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all samples in this epoch.
    pub train_loss: f64,
    /// Mean loss on the held-out subset.
    pub test_loss: f64,
    /// Held-out accuracy as a percentage in [0, 100].
    pub accuracy: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Passed to the batch hook after each applied update.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub epoch: usize,
    /// 1-based batch number within the epoch.
    pub batch: usize,
    pub total_batches: usize,
    /// Mean per-example loss of this batch.
    pub batch_loss: f64,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// All configured epochs completed.
    Completed,
    /// Stopped early by the cancellation token or a dropped progress receiver.
    Cancelled,
}

/// Everything a finished run reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub results: Vec<EpochResult>,
    pub outcome: RunOutcome,
    /// Parameter updates applied over the whole run, including those of a
    /// cancelled partial epoch.
    pub batches_applied: usize,
}

impl TrainReport {
    pub fn loss_history(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.train_loss).collect()
    }

    pub fn accuracy_history(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.accuracy).collect()
    }

    pub fn last(&self) -> Option<&EpochResult> {
        self.results.last()
    }
}
