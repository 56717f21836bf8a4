use thiserror::Error;

/// Errors reported by layer/network construction and by runtime shape checks.
///
/// Construction errors leave the caller without a usable network; shape errors
/// fail only the offending call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("a layer needs at least one neuron")]
    EmptyLayer,

    #[error("input vector has length {got} but the input layer has {expected} neurons")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("a network needs at least an input and an output layer, got {0}")]
    TooFewLayers(usize),

    #[error("the first layer of a network must be an input layer without incoming weights")]
    MissingInputLayer,

    #[error("layer {0} is an input layer, but only the first layer may be one")]
    MisplacedInputLayer(usize),

    #[error("layer {index} expects {expected} inputs but its predecessor has {got} neurons")]
    ChainMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("{functions} activation functions provided for {layers} layers")]
    ActivationCountMismatch { functions: usize, layers: usize },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,
}
