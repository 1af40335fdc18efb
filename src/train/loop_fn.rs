use std::time::Instant;

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::sample::Sample;
use crate::error::{NetError, Result};
use crate::network::network::Network;
use crate::train::epoch_stats::{BatchProgress, EpochResult, RunOutcome, TrainReport};
use crate::train::evaluate::{check_samples, evaluate_unchecked};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_batch;

/// Where the driver currently is. Only used for debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Shuffling,
    BatchLoop,
    Evaluating,
    Reporting,
    Done,
    Cancelled,
}

fn enter(phase: Phase, epoch: usize) {
    debug!("epoch {}: {:?}", epoch, phase);
}

/// Trains `network` for `config.epochs` epochs of shuffled mini-batch SGD.
///
/// Every epoch reshuffles the training indices, applies one update per
/// batch (the last batch may be short), then evaluates on the first
/// `config.eval_limit` samples of `test`.
///
/// # Early termination
/// The run stops with `RunOutcome::Cancelled` if:
/// - `config.cancel` is set, checked before every epoch and every batch, **or**
/// - the `progress_tx` receiver has been dropped.
///
/// Batches already applied stay applied.
///
/// # Errors
/// - `InvalidConfig` for a zero batch size, a bad learning rate, an empty
///   training set, or samples that do not fit the architecture
/// - `NumericInstability` when a batch yields a non-finite loss or update,
///   in which case the parameters keep the state before that batch, or when
///   the held-out loss is non-finite
pub fn train(network: &Network, train: &[Sample], test: &[Sample], mut config: TrainConfig) -> Result<TrainReport> {
    config.validate()?;
    if train.is_empty() {
        return Err(NetError::InvalidConfig("training set is empty".into()));
    }
    let arch = network.architecture();
    let test = &test[..test.len().min(config.eval_limit)];
    check_samples(arch, train, "training")?;
    check_samples(arch, test, "held-out")?;

    if let Some(lr) = config.learning_rate {
        network.set_learning_rate(lr);
    }

    let n = train.len();
    let total_batches = n.div_ceil(config.batch_size);
    info!(
        "training {}-{}-{} network: {} samples, {} epochs, {} batches/epoch, lr {}",
        arch.input_size,
        arch.hidden_size,
        arch.output_size,
        n,
        config.epochs,
        total_batches,
        network.learning_rate()
    );
    enter(Phase::Idle, 0);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..n).collect();
    let mut report = TrainReport {
        results: Vec::new(),
        outcome: RunOutcome::Completed,
        batches_applied: 0,
    };

    'epochs: for epoch in 1..=config.epochs {
        if config.cancel.is_cancelled() {
            report.outcome = RunOutcome::Cancelled;
            break;
        }
        let t_start = Instant::now();

        enter(Phase::Shuffling, epoch);
        indices.shuffle(&mut rng);

        enter(Phase::BatchLoop, epoch);
        let mut loss_sum = 0.0;
        let mut batch: Vec<&Sample> = Vec::with_capacity(config.batch_size);
        for (b, chunk) in indices.chunks(config.batch_size).enumerate() {
            if config.cancel.is_cancelled() {
                report.outcome = RunOutcome::Cancelled;
                break 'epochs;
            }
            batch.clear();
            batch.extend(chunk.iter().map(|&i| &train[i]));

            let batch_loss = train_batch(network, &batch, epoch, b + 1)?;
            loss_sum += batch_loss * batch.len() as f64;
            report.batches_applied += 1;

            if let Some(hook) = config.batch_hook.as_mut() {
                hook(&BatchProgress { epoch, batch: b + 1, total_batches, batch_loss });
            }
        }

        enter(Phase::Evaluating, epoch);
        let eval = evaluate_unchecked(network, test);
        if !eval.loss.is_finite() {
            return Err(NetError::NumericInstability {
                epoch,
                batch: total_batches,
                reason: format!("held-out loss is {}", eval.loss),
            });
        }

        enter(Phase::Reporting, epoch);
        let result = EpochResult {
            epoch,
            total_epochs: config.epochs,
            train_loss: loss_sum / n as f64,
            test_loss: eval.loss,
            accuracy: eval.accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            "epoch {}/{}: train loss {:.4}, test loss {:.4}, accuracy {:.2}% ({}/{}), {} ms",
            epoch,
            config.epochs,
            result.train_loss,
            result.test_loss,
            result.accuracy,
            eval.correct,
            eval.total,
            result.elapsed_ms
        );
        report.results.push(result.clone());

        if let Some(ref tx) = config.progress_tx {
            // Nobody is listening any more.
            if tx.send(result).is_err() {
                report.outcome = RunOutcome::Cancelled;
                break;
            }
        }
    }

    match report.outcome {
        RunOutcome::Completed => enter(Phase::Done, report.results.len()),
        RunOutcome::Cancelled => {
            enter(Phase::Cancelled, report.results.len());
            warn!(
                "training cancelled after {} completed epochs ({} batches applied)",
                report.results.len(),
                report.batches_applied
            );
        }
    }
    Ok(report)
}
