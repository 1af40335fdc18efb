/// One decoded example: normalized pixels and the digit they show.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Pixel intensities in `[0.0, 1.0]`, row-major.
    pub features: Vec<f64>,
    /// Class index in `[0, n_classes)`.
    pub label: usize,
}

impl Sample {
    pub fn new(features: Vec<f64>, label: usize) -> Self {
        Sample { features, label }
    }
}
