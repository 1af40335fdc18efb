pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod data;

// Convenience re-exports
pub use error::{NetError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{Architecture, Hyperparams, Network, NetworkParameters, Prediction};
pub use loss::cross_entropy::CrossEntropyLoss;
pub use optim::sgd::Sgd;
pub use data::{load_split, Sample};
pub use train::{evaluate, train, CancellationToken, EpochResult, RunOutcome, TrainConfig, TrainReport};
