pub mod network;
pub mod params;
pub mod propagation;
pub mod record;
pub mod spec;
pub mod store;

pub use network::{argmax, Network, Prediction};
pub use params::{Gradients, NetworkParameters};
pub use propagation::{backward, ForwardCache};
pub use record::ModelRecord;
pub use spec::{Architecture, Hyperparams};
pub use store::{NonFiniteUpdate, ParameterStore};
