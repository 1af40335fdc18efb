use std::env;
use std::path::Path;
use std::process;
use std::str::FromStr;

use log::info;
use rand::{rngs::StdRng, SeedableRng};

use neuro_digits::{
    data::{TEST_SPLIT, TRAIN_SPLIT},
    evaluate, load_split, train, Architecture, Hyperparams, NetError, Network, Result, TrainConfig,
};

const USAGE: &str = "\
Usage:
  neuro-digits train <data-dir> <model.json> [epochs] [batch] [lr]
  neuro-digits evaluate <model.json> <data-dir>
  neuro-digits predict <model.json> <image>

<data-dir> holds train-images.idx3-ubyte, train-labels.idx1-ubyte,
t10k-images.idx3-ubyte and t10k-labels.idx1-ubyte.
Set SEED to make a run reproducible and RUST_LOG=debug for phase logs.";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("train") if (3..=6).contains(&args.len()) => run_train(&args[1..]),
        Some("evaluate") if args.len() == 3 => run_evaluate(&args[1], &args[2]),
        Some("predict") if args.len() == 3 => run_predict(&args[1], &args[2]),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run_train(args: &[String]) -> Result<()> {
    let defaults = Hyperparams::default();
    let hp = Hyperparams {
        epochs: parse_arg(args.get(2), "epochs", defaults.epochs)?,
        batch_size: parse_arg(args.get(3), "batch", defaults.batch_size)?,
        learning_rate: parse_arg(args.get(4), "lr", defaults.learning_rate)?,
        ..defaults
    };
    let (data_dir, model_path) = (Path::new(&args[0]), Path::new(&args[1]));
    let seed = match env::var("SEED") {
        Ok(s) => parse_arg(Some(&s), "SEED", 0u64)?,
        Err(_) => rand::random(),
    };
    info!("seed {}", seed);

    let train_set = load_split(data_dir, TRAIN_SPLIT)?;
    let test_set = load_split(data_dir, TEST_SPLIT)?;

    let network = if model_path.exists() {
        info!("resuming from {}", model_path.display());
        Network::load_json(model_path)?
    } else {
        Network::initialize(Architecture::mnist(), hp.learning_rate, &mut StdRng::seed_from_u64(seed))?
    };

    let config = TrainConfig::from_hyperparams(&hp).with_seed(seed);
    let report = train(&network, &train_set, &test_set, config)?;
    network.save_json(model_path)?;

    if let Some(last) = report.last() {
        println!(
            "{} epochs, final accuracy {:.2}%, test loss {:.4}; model saved to {}",
            report.results.len(),
            last.accuracy,
            last.test_loss,
            model_path.display()
        );
    }
    Ok(())
}

fn run_evaluate(model_path: &str, data_dir: &str) -> Result<()> {
    let network = Network::load_json(model_path)?;
    let test_set = load_split(data_dir, TEST_SPLIT)?;
    let eval = evaluate(&network, &test_set, usize::MAX)?;
    println!(
        "accuracy {:.2}% ({}/{}), loss {:.4}",
        eval.accuracy, eval.correct, eval.total, eval.loss
    );
    Ok(())
}

fn run_predict(model_path: &str, image_path: &str) -> Result<()> {
    let network = Network::load_json(model_path)?;
    let prediction = network.predict_image(image_path)?;
    println!("{} (confidence {:.3})", prediction.label, prediction.confidence);
    Ok(())
}

fn parse_arg<T: FromStr>(raw: Option<&String>, name: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| NetError::InvalidConfig(format!("{} must be a number, got '{}'", name, s))),
    }
}
