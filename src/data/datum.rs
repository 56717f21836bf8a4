/// One training or evaluation example: an input vector paired with the target
/// vector the network should produce for it.
///
/// The input length must match the network's input layer and the target length
/// its output layer. A `Datum` is immutable once built; the network only ever
/// reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    input: Vec<f64>,
    target: Vec<f64>,
}

impl Datum {
    pub fn new(input: Vec<f64>, target: Vec<f64>) -> Datum {
        Datum { input, target }
    }

    pub fn input(&self) -> &[f64] {
        &self.input
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }
}
