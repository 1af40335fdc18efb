use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use rand::Rng;
use serde::Serialize;

use crate::{
    data::image::image_file_to_grayscale_input,
    error::{NetError, Result},
    network::{
        params::{Gradients, NetworkParameters},
        propagation::{self, ForwardCache},
        record::ModelRecord,
        spec::Architecture,
        store::{NonFiniteUpdate, ParameterStore},
    },
};

/// The predicted class and the softmax probability assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: usize,
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

/// A one-hidden-layer classifier: ReLU hidden layer, softmax output.
///
/// Parameters live in a `ParameterStore`, so a `Network` can be shared by
/// reference between the workers of a batch.
#[derive(Debug, Clone)]
pub struct Network {
    store: ParameterStore,
}

impl Network {
    /// Builds a freshly initialized network. Fails for degenerate shapes.
    pub fn initialize<R: Rng + ?Sized>(arch: Architecture, learning_rate: f64, rng: &mut R) -> Result<Network> {
        let params = NetworkParameters::initialize(arch, learning_rate, rng)?;
        Ok(Network::from_parameters(params))
    }

    pub fn from_parameters(params: NetworkParameters) -> Network {
        Network { store: ParameterStore::new(params) }
    }

    pub fn architecture(&self) -> Architecture {
        self.store.read().architecture()
    }

    pub fn learning_rate(&self) -> f64 {
        self.store.learning_rate()
    }

    pub fn set_learning_rate(&self, learning_rate: f64) {
        self.store.set_learning_rate(learning_rate);
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> NetworkParameters {
        self.store.snapshot()
    }

    /// Forward pass against the current parameters.
    pub fn forward(&self, input: &[f64]) -> Result<ForwardCache> {
        let params = self.store.read();
        check_input(&params, input)?;
        Ok(propagation::forward(&params, input))
    }

    /// Gradients for one example, given the cache of its forward pass.
    pub fn backward(&self, cache: &ForwardCache, input: &[f64], target: &[f64], batch_size: usize) -> Gradients {
        propagation::backward(&self.store.read(), cache, input, target, batch_size)
    }

    pub fn apply_gradients(&self, grads: &Gradients, batch_size: usize) -> std::result::Result<(), NonFiniteUpdate> {
        self.store.apply_gradients(grads, batch_size)
    }

    /// Classifies one feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        let output = self.forward(features)?.output;
        let label = argmax(&output);
        Ok(Prediction {
            label,
            confidence: output[label],
            probabilities: output,
        })
    }

    /// Classifies an image file. The image is converted to grayscale and
    /// resized to the network's square input side.
    pub fn predict_image(&self, path: impl AsRef<Path>) -> Result<Prediction> {
        let input_size = self.architecture().input_size;
        let side = (input_size as f64).sqrt() as u32;
        if (side * side) as usize != input_size {
            return Err(NetError::InvalidModel(format!(
                "input size {} is not a square image",
                input_size
            )));
        }
        let features = image_file_to_grayscale_input(path, side, side)?;
        self.predict(&features)
    }

    /// Serializes the network to pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let record = ModelRecord::from(&*self.store.read());
        serde_json::to_writer_pretty(writer, &record)?;
        Ok(())
    }

    /// Deserializes a network written by `write_json`.
    pub fn read_json<R: Read>(reader: R) -> Result<Network> {
        let record: ModelRecord = serde_json::from_reader(reader)?;
        Ok(Network::from_parameters(NetworkParameters::try_from(record)?))
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| NetError::io(path.display().to_string(), e))?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer.flush().map_err(|e| NetError::io(path.display().to_string(), e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NetError::io(path.display().to_string(), e))?;
        Network::read_json(BufReader::new(file))
    }
}

fn check_input(params: &NetworkParameters, input: &[f64]) -> Result<()> {
    let expected = params.hidden.input_size();
    if input.len() != expected {
        return Err(NetError::InputSize { expected, got: input.len() });
    }
    Ok(())
}

/// Index of the maximum element in a slice.
///
/// NaN entries compare as equal to everything, so the result is only
/// meaningful for finite input; the training loop rejects non-finite outputs
/// before they reach here.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn test_network() -> Network {
        Network::initialize(Architecture::new(4, 6, 3), 0.1, &mut StdRng::seed_from_u64(21)).unwrap()
    }

    #[test]
    fn predict_reports_argmax_and_its_probability() {
        let network = test_network();
        let prediction = network.predict(&[0.1, 0.9, 0.4, 0.0]).unwrap();
        let max = prediction.probabilities.iter().copied().fold(f64::MIN, f64::max);
        assert_eq!(prediction.confidence, max);
        assert_eq!(prediction.probabilities[prediction.label], max);
    }

    #[test]
    fn predict_rejects_wrong_input_length() {
        let err = test_network().predict(&[0.5; 3]).unwrap_err();
        assert!(matches!(err, NetError::InputSize { expected: 4, got: 3 }));
    }

    #[test]
    fn forward_reports_wrong_input_length_instead_of_panicking() {
        let err = test_network().forward(&[0.5; 5]).unwrap_err();
        assert!(matches!(err, NetError::InputSize { expected: 4, got: 5 }));
    }

    #[test]
    fn json_round_trip_keeps_predictions_identical() {
        let network = test_network();
        let mut buf = Vec::new();
        network.write_json(&mut buf).unwrap();
        let restored = Network::read_json(buf.as_slice()).unwrap();

        let inputs = [[0.0, 0.0, 0.0, 0.0], [1.0, 0.5, 0.25, 0.125], [0.3, 0.7, 0.9, 0.1]];
        for input in inputs {
            assert_eq!(network.predict(&input).unwrap(), restored.predict(&input).unwrap());
        }
        assert_eq!(network.parameters(), restored.parameters());
    }

    #[test]
    fn load_json_reports_missing_file() {
        let err = Network::load_json("/definitely/not/here/model.json").unwrap_err();
        assert!(matches!(err, NetError::Io { .. }));
    }

    #[test]
    fn argmax_finds_largest_entry() {
        assert_eq!(argmax(&[0.1, 0.7, 0.05, 0.15]), 1);
        assert_eq!(argmax(&[-3.0, -1.0]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
