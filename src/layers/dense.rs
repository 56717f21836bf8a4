use std::fmt;

use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;
use crate::network::error::NetworkError;

/// The matrices tying a layer to its predecessor. Absent on the input layer.
#[derive(Debug, Clone)]
struct Connection {
    /// `weights.data[h][i]` connects predecessor neuron `i` to neuron `h`.
    weights: Matrix,
    /// Accumulated error gradient; zeroed by every weight update.
    gradient: Matrix,
    /// The previous weight delta, kept across updates for momentum.
    last_delta: Matrix,
}

/// One fully-connected layer of neurons.
///
/// Layers are chained by the [`Network`](crate::Network), which owns them in
/// order and feeds each one its predecessor's output. A layer stores both the
/// pre-activation sums and the activated output of its last forward pass;
/// backpropagation reads the pre-activations to evaluate activation
/// derivatives at the right point.
#[derive(Debug, Clone)]
pub struct Layer {
    size: usize,
    activation: ActivationFunction,
    connection: Option<Connection>,
    /// Pre-activation sums of the last forward pass. On the input layer this
    /// is the raw input vector itself.
    pre_activation: Vec<f64>,
    /// Activated values of the last forward pass.
    output: Vec<f64>,
}

impl Layer {
    /// Creates the input layer of a network. It has no incoming weights and
    /// passes the vector given to [`set_input`](Layer::set_input) through
    /// unchanged.
    pub fn input(size: usize, activation: ActivationFunction) -> Result<Layer, NetworkError> {
        if size == 0 {
            return Err(NetworkError::EmptyLayer);
        }

        Ok(Layer {
            size,
            activation,
            connection: None,
            pre_activation: vec![0.0; size],
            output: vec![0.0; size],
        })
    }

    /// Creates a hidden or output layer fed by `input_size` predecessor
    /// neurons. Weights start at uniform random values in (-0.5, 0.5); the
    /// gradient and momentum buffers start at zero.
    pub fn dense(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
    ) -> Result<Layer, NetworkError> {
        if size == 0 || input_size == 0 {
            return Err(NetworkError::EmptyLayer);
        }

        Ok(Layer {
            size,
            activation,
            connection: Some(Connection {
                weights: Matrix::random_uniform(size, input_size),
                gradient: Matrix::zeros(size, input_size),
                last_delta: Matrix::zeros(size, input_size),
            }),
            pre_activation: vec![0.0; size],
            output: vec![0.0; size],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// True for a layer built with [`Layer::input`].
    pub fn is_input(&self) -> bool {
        self.connection.is_none()
    }

    /// Number of predecessor neurons this layer expects, `None` on the input
    /// layer.
    pub fn input_size(&self) -> Option<usize> {
        self.connection.as_ref().map(|c| c.weights.cols)
    }

    /// The weight matrix, `None` on the input layer. Read-only diagnostics.
    pub fn weights(&self) -> Option<&Matrix> {
        self.connection.as_ref().map(|c| &c.weights)
    }

    /// Activated values of the last forward pass, as a read-only snapshot.
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Pre-activation sums of the last forward pass, as a read-only snapshot.
    pub fn pre_activation(&self) -> &[f64] {
        &self.pre_activation
    }

    /// Stores a fresh sample on the input layer, replacing whatever was set
    /// before. The vector becomes both this layer's pre-activation and its
    /// output (identity pass-through); nothing is propagated until the next
    /// forward pass.
    pub fn set_input(&mut self, input: &[f64]) -> Result<(), NetworkError> {
        if input.len() != self.size {
            return Err(NetworkError::ShapeMismatch {
                expected: self.size,
                got: input.len(),
            });
        }

        self.pre_activation.copy_from_slice(input);
        self.output.copy_from_slice(input);
        Ok(())
    }

    /// Computes this layer's activations from the predecessor's output and
    /// stores both the pre-activation sums and the activated values for the
    /// backward pass. No-op on the input layer, whose state is set by
    /// [`set_input`](Layer::set_input).
    pub fn feed_from(&mut self, prev_output: &[f64]) {
        let connection = match &self.connection {
            Some(c) => c,
            None => return,
        };

        for h in 0..self.size {
            let mut sum = 0.0;
            for (i, x) in prev_output.iter().enumerate() {
                sum += connection.weights.data[h][i] * x;
            }
            self.pre_activation[h] = sum;
            self.output[h] = self.activation.compute(sum);
        }
    }

    /// Adds the outer product of the error signal and the predecessor's output
    /// into the gradient accumulator. Calls between two weight updates add up,
    /// which is what batch training relies on. No-op on the input layer.
    pub fn accumulate_gradient(&mut self, error: &[f64], prev_output: &[f64]) {
        let connection = match &mut self.connection {
            Some(c) => c,
            None => return,
        };

        for (h, e) in error.iter().enumerate() {
            for (i, x) in prev_output.iter().enumerate() {
                connection.gradient.data[h][i] += e * x;
            }
        }
    }

    /// Folds the error signal backwards through the weight matrix and scales
    /// each component by the predecessor's activation derivative, evaluated at
    /// the predecessor's own stored pre-activation sums. Returns the error
    /// signal for the predecessor; empty on the input layer.
    pub fn propagate_error(&self, error: &[f64], predecessor: &Layer) -> Vec<f64> {
        let connection = match &self.connection {
            Some(c) => c,
            None => return Vec::new(),
        };

        let mut prev_error = vec![0.0; predecessor.size()];
        for (i, prev_e) in prev_error.iter_mut().enumerate() {
            let mut raw = 0.0;
            for (h, e) in error.iter().enumerate() {
                raw += e * connection.weights.data[h][i];
            }
            *prev_e = raw
                * predecessor
                    .activation
                    .derivative(predecessor.pre_activation[i]);
        }
        prev_error
    }

    /// Plain gradient-descent step: `w -= eta * gradient`. The gradient
    /// accumulator is zeroed afterwards, even when `eta` is 0. No-op on the
    /// input layer.
    pub fn update(&mut self, eta: f64) {
        let connection = match &mut self.connection {
            Some(c) => c,
            None => return,
        };

        for h in 0..connection.weights.rows {
            for i in 0..connection.weights.cols {
                connection.weights.data[h][i] -= eta * connection.gradient.data[h][i];
            }
        }
        connection.gradient.clear();
    }

    /// Momentum step: blends the previous weight delta into the current one to
    /// damp oscillation, via
    /// `delta = eta * ((1 - momentum) * gradient + momentum * last_delta)`.
    /// A momentum of 0 produces the same weights as [`update`](Layer::update).
    /// The gradient accumulator is zeroed afterwards.
    pub fn update_with_momentum(&mut self, eta: f64, momentum: f64) {
        let connection = match &mut self.connection {
            Some(c) => c,
            None => return,
        };
        let carry = 1.0 - momentum;

        for h in 0..connection.weights.rows {
            for i in 0..connection.weights.cols {
                let delta = eta
                    * (carry * connection.gradient.data[h][i]
                        + momentum * connection.last_delta.data[h][i]);
                connection.last_delta.data[h][i] = delta;
                connection.weights.data[h][i] -= delta;
            }
        }
        connection.gradient.clear();
    }
}

/// Human-readable dump of the incoming weight matrix. Input layers print
/// nothing. Diagnostic only; the format is not meant to be parsed back.
impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connection = match &self.connection {
            Some(c) => c,
            None => return Ok(()),
        };

        write!(f, "prev:")?;
        for i in 0..connection.weights.cols {
            write!(f, "\t[{i}]")?;
        }
        for h in 0..self.size {
            write!(f, "\nneuron [{h}]")?;
            for i in 0..connection.weights.cols {
                write!(f, "\t{}", connection.weights.data[h][i])?;
            }
        }
        Ok(())
    }
}
