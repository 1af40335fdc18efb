use std::fmt;
use std::sync::mpsc;

use crate::error::{NetError, Result};
use crate::network::spec::{learning_rate_problem, Hyperparams};
use crate::train::cancel::CancellationToken;
use crate::train::epoch_stats::{BatchProgress, EpochResult};

/// Callback invoked on the training thread after every applied batch.
pub type BatchHook = Box<dyn FnMut(&BatchProgress) + Send>;

/// Configuration for a `train` run.
///
/// # Fields
/// - `epochs`       : total number of full passes over the training data
/// - `batch_size`   : samples per mini-batch; use `1` for online SGD
/// - `learning_rate`: overrides the network's learning rate when set
/// - `seed`         : seeds the shuffling RNG
/// - `eval_limit`   : how many held-out samples to evaluate per epoch
/// - `cancel`       : cooperative stop signal, checked between batches
/// - `progress_tx`  : optional channel sender; one `EpochResult` is sent per
///                  completed epoch. If the receiver is dropped the loop
///                  terminates early.
/// - `batch_hook`   : optional per-batch callback
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: Option<f64>,
    pub seed: u64,
    pub eval_limit: usize,
    pub cancel: CancellationToken,
    pub progress_tx: Option<mpsc::Sender<EpochResult>>,
    pub batch_hook: Option<BatchHook>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel, no hook and
    /// the whole held-out set evaluated every epoch.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            learning_rate: None,
            seed: 0,
            eval_limit: usize::MAX,
            cancel: CancellationToken::new(),
            progress_tx: None,
            batch_hook: None,
        }
    }

    pub fn from_hyperparams(hp: &Hyperparams) -> Self {
        TrainConfig {
            learning_rate: Some(hp.learning_rate),
            eval_limit: hp.eval_limit,
            ..TrainConfig::new(hp.epochs, hp.batch_size)
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn with_eval_limit(mut self, eval_limit: usize) -> Self {
        self.eval_limit = eval_limit;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochResult>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_batch_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&BatchProgress) + Send + 'static,
    {
        self.batch_hook = Some(Box::new(hook));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NetError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if let Some(problem) = self.learning_rate.and_then(learning_rate_problem) {
            return Err(NetError::InvalidConfig(problem));
        }
        Ok(())
    }
}

impl fmt::Debug for TrainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainConfig")
            .field("epochs", &self.epochs)
            .field("batch_size", &self.batch_size)
            .field("learning_rate", &self.learning_rate)
            .field("seed", &self.seed)
            .field("eval_limit", &self.eval_limit)
            .field("cancel", &self.cancel)
            .field("progress_tx", &self.progress_tx.is_some())
            .field("batch_hook", &self.batch_hook.is_some())
            .finish()
    }
}
