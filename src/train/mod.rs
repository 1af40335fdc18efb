pub mod cancel;
pub mod epoch_stats;
pub mod evaluate;
pub mod loop_fn;
pub mod train_config;
pub mod trainer;

pub use cancel::CancellationToken;
pub use epoch_stats::{BatchProgress, EpochResult, RunOutcome, TrainReport};
pub use evaluate::{evaluate, Evaluation};
pub use loop_fn::train;
pub use train_config::{BatchHook, TrainConfig};
pub use trainer::{accumulate_batch, train_batch, BatchSum};
