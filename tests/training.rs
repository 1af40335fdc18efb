use std::sync::mpsc;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use neuro_digits::{
    network::NetworkParameters,
    train::{train_batch, CancellationToken},
    Architecture, NetError, Network, RunOutcome, Sample, TrainConfig,
};

fn toy_samples() -> Vec<Sample> {
    vec![
        Sample::new(vec![1.0, 0.0, 0.2], 0),
        Sample::new(vec![0.9, 0.1, 0.0], 0),
        Sample::new(vec![0.0, 1.0, 0.8], 1),
        Sample::new(vec![0.1, 0.9, 1.0], 1),
    ]
}

fn grid_samples(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let label = i % 2;
            let t = i as f64 / n as f64;
            let mut x = vec![t, 1.0 - t, 0.5];
            x[label] += 1.0;
            Sample::new(x, label)
        })
        .collect()
}

fn toy_network(seed: u64) -> Network {
    Network::initialize(Architecture::new(3, 8, 2), 0.1, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn assert_params_close(a: &NetworkParameters, b: &NetworkParameters) {
    let pairs = [
        (a.weights1().as_slice(), b.weights1().as_slice()),
        (a.weights2().as_slice(), b.weights2().as_slice()),
        (a.biases1(), b.biases1()),
        (a.biases2(), b.biases2()),
    ];
    for (xs, ys) in pairs {
        assert_eq!(xs.len(), ys.len());
        for (x, y) in xs.iter().zip(ys) {
            assert!((x - y).abs() < 1e-12, "{} vs {}", x, y);
        }
    }
}

#[test]
fn held_out_loss_decreases_on_a_toy_problem() {
    let data = toy_samples();
    let config = TrainConfig::new(2, 4).with_seed(7);
    let report = neuro_digits::train(&toy_network(1), &data, &data, config).unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.results.len(), 2);
    assert!(
        report.results[1].test_loss < report.results[0].test_loss,
        "{:?}",
        report.results
    );
}

#[test]
fn longer_training_separates_the_toy_classes() {
    let data = toy_samples();
    let network = toy_network(2);
    let config = TrainConfig::new(300, 2).with_seed(3).with_learning_rate(0.3);
    let report = neuro_digits::train(&network, &data, &data, config).unwrap();
    assert_eq!(report.last().unwrap().accuracy, 100.0);
    for sample in &data {
        assert_eq!(network.predict(&sample.features).unwrap().label, sample.label);
    }
}

#[test]
fn cancellation_mid_epoch_leaves_whole_batches_applied() {
    let data = grid_samples(24);
    let initial = toy_network(4);
    let network = initial.clone();
    let seed = 99;
    let batch_size = 5;

    let token = CancellationToken::new();
    let handle = token.clone();
    let config = TrainConfig::new(3, batch_size)
        .with_seed(seed)
        .with_cancellation(token)
        .with_batch_hook(move |p| {
            if p.epoch == 2 && p.batch == 3 {
                handle.cancel();
            }
        });
    let report = neuro_digits::train(&network, &data, &data, config).unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.results.len(), 1);
    // Epoch 1 has ceil(24 / 5) = 5 batches, then 3 more before the stop.
    assert_eq!(report.batches_applied, 8);

    // Replay the same shuffles and apply exactly eight batches.
    let replay = initial;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..data.len()).collect();
    let mut applied = 0;
    'outer: for epoch in 1..=2 {
        indices.shuffle(&mut rng);
        for (b, chunk) in indices.chunks(batch_size).enumerate() {
            if applied == 8 {
                break 'outer;
            }
            let batch: Vec<&Sample> = chunk.iter().map(|&i| &data[i]).collect();
            train_batch(&replay, &batch, epoch, b + 1).unwrap();
            applied += 1;
        }
    }
    assert_params_close(&network.parameters(), &replay.parameters());
}

#[test]
fn cancelled_before_start_changes_nothing() {
    let data = toy_samples();
    let network = toy_network(5);
    let before = network.parameters();
    let token = CancellationToken::new();
    token.cancel();

    let report =
        neuro_digits::train(&network, &data, &data, TrainConfig::new(5, 2).with_cancellation(token)).unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.results.is_empty());
    assert_eq!(report.batches_applied, 0);
    assert_eq!(network.parameters(), before);
}

#[test]
fn progress_arrives_once_per_epoch_in_order() {
    let data = grid_samples(10);
    let (tx, rx) = mpsc::channel();
    let report = neuro_digits::train(&toy_network(6), &data, &data, TrainConfig::new(4, 3).with_progress(tx)).unwrap();

    let received: Vec<_> = rx.iter().collect();
    assert_eq!(received, report.results);
    let epochs: Vec<usize> = received.iter().map(|r| r.epoch).collect();
    assert_eq!(epochs, vec![1, 2, 3, 4]);
    assert!(received.iter().all(|r| r.total_epochs == 4));
    assert!(received.iter().all(|r| (0.0..=100.0).contains(&r.accuracy)));
}

#[test]
fn training_runs_on_a_background_thread() {
    let data = grid_samples(16);
    let network = toy_network(7);
    let (tx, rx) = mpsc::channel();
    let token = CancellationToken::new();
    let config = TrainConfig::new(1_000_000, 4).with_progress(tx).with_cancellation(token.clone());

    let worker = {
        let network = network.clone();
        std::thread::spawn(move || neuro_digits::train(&network, &data, &data, config))
    };
    let first = rx.recv().unwrap();
    assert_eq!(first.epoch, 1);
    token.cancel();

    let report = worker.join().unwrap().unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.results.len() < 1_000_000);
}

#[test]
fn shuffle_is_uniform_over_permutations() {
    let mut rng = StdRng::seed_from_u64(2024);
    let perms: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let mut counts = [0usize; 6];
    let trials = 60_000;
    for _ in 0..trials {
        let mut order = [0usize, 1, 2];
        order.shuffle(&mut rng);
        let slot = perms.iter().position(|p| *p == order).unwrap();
        counts[slot] += 1;
    }
    for count in counts {
        assert!((9_400..=10_600).contains(&count), "{:?}", counts);
    }
}

#[test]
fn zero_hidden_units_are_rejected() {
    let result = Network::initialize(Architecture::new(784, 0, 10), 0.01, &mut StdRng::seed_from_u64(0));
    assert!(matches!(result, Err(NetError::InvalidArchitecture(_))));
}

#[test]
fn negative_learning_rate_is_rejected_at_initialization() {
    let result = Network::initialize(Architecture::new(3, 8, 2), -0.5, &mut StdRng::seed_from_u64(0));
    assert!(matches!(result, Err(NetError::InvalidArchitecture(_))));
}

#[test]
fn samples_that_do_not_fit_are_rejected() {
    let network = toy_network(8);
    let bad = vec![Sample::new(vec![1.0, 0.0], 0)];
    let result = neuro_digits::train(&network, &bad, &[], TrainConfig::new(1, 1));
    assert!(matches!(result, Err(NetError::InvalidConfig(_))));
}
