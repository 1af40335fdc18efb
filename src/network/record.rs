use serde::{Deserialize, Serialize};

use crate::{
    activation::activation::ActivationFunction,
    error::{NetError, Result},
    layers::dense::Layer,
    math::matrix::Matrix,
    network::{params::NetworkParameters, spec::learning_rate_problem},
};

/// On-disk model format.
///
/// Matrices are stored row-major as nested arrays: `weights1` is
/// `[inputSize][hiddenSize]`, `weights2` is `[hiddenSize][outputSize]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub learning_rate: f64,
    pub weights1: Vec<Vec<f64>>,
    pub weights2: Vec<Vec<f64>>,
    pub biases1: Vec<f64>,
    pub biases2: Vec<f64>,
}

impl From<&NetworkParameters> for ModelRecord {
    fn from(params: &NetworkParameters) -> Self {
        let arch = params.architecture();
        ModelRecord {
            input_size: arch.input_size,
            hidden_size: arch.hidden_size,
            output_size: arch.output_size,
            learning_rate: params.learning_rate,
            weights1: params.weights1().to_rows(),
            weights2: params.weights2().to_rows(),
            biases1: params.biases1().to_vec(),
            biases2: params.biases2().to_vec(),
        }
    }
}

impl TryFrom<ModelRecord> for NetworkParameters {
    type Error = NetError;

    /// Rebuilds parameters, checking every array against the declared sizes.
    fn try_from(record: ModelRecord) -> Result<Self> {
        let expect = |what: &str, got: (usize, usize), want: (usize, usize)| -> Result<()> {
            if got == want {
                Ok(())
            } else {
                Err(NetError::InvalidModel(format!(
                    "{} has shape {}×{}, expected {}×{}",
                    what, got.0, got.1, want.0, want.1
                )))
            }
        };

        let w1 = Matrix::from_rows(record.weights1)?;
        let w2 = Matrix::from_rows(record.weights2)?;
        expect("weights1", (w1.rows, w1.cols), (record.input_size, record.hidden_size))?;
        expect("weights2", (w2.rows, w2.cols), (record.hidden_size, record.output_size))?;
        expect("biases1", (1, record.biases1.len()), (1, record.hidden_size))?;
        expect("biases2", (1, record.biases2.len()), (1, record.output_size))?;

        let params = NetworkParameters {
            hidden: Layer::from_parts(w1, record.biases1, ActivationFunction::ReLU)?,
            output: Layer::from_parts(w2, record.biases2, ActivationFunction::Softmax)?,
            learning_rate: record.learning_rate,
        };
        params.architecture().validate()?;
        if !params.is_finite() {
            return Err(NetError::InvalidModel("model contains non-finite values".into()));
        }
        if let Some(problem) = learning_rate_problem(params.learning_rate) {
            return Err(NetError::InvalidModel(problem));
        }
        Ok(params)
    }
}
