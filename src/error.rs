use std::io;

use thiserror::Error;

/// Everything that can go wrong while loading data, building a network or
/// training it. Cancellation is not in here: a cancelled run is reported as
/// `RunOutcome::Cancelled`.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("{source_name}: invalid format: {reason}")]
    Format { source_name: String, reason: String },

    #[error("{source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: io::Error,
    },

    #[error("numeric instability at epoch {epoch}, batch {batch}: {reason}")]
    NumericInstability {
        epoch: usize,
        batch: usize,
        reason: String,
    },

    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("input has {got} features, network expects {expected}")]
    InputSize { expected: usize, got: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl NetError {
    pub fn format(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        NetError::Format {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(source_name: impl Into<String>, source: io::Error) -> Self {
        NetError::Io {
            source_name: source_name.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, NetError>;
