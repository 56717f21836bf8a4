use std::fmt;

use log::debug;

use crate::activation::activation::ActivationFunction;
use crate::data::datum::Datum;
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::error::NetworkError;

/// The layer chain of a network, input layer first.
///
/// An `Empty` chain is a valid state: every training or evaluation call on it
/// is a harmless no-op that reports zero error, so callers can hold an
/// unconfigured network without special-casing it.
#[derive(Debug, Clone)]
enum Chain {
    Empty,
    Layers(Vec<Layer>),
}

/// A feed-forward network of fully-connected layers, trained by error
/// backpropagation.
///
/// The network owns its layers as an ordered vector and walks them by index:
/// forwards for activation, backwards for gradient accumulation. Training is
/// caller-driven; [`train_online`](Network::train_online) and
/// [`train_batch`](Network::train_batch) each perform one pass over a dataset
/// and return the error measured afterwards, leaving iteration counts and stop
/// conditions to the caller.
#[derive(Debug, Clone)]
pub struct Network {
    chain: Chain,
    /// Samples processed by batch training so far. Carried across calls, so a
    /// partial batch at the end of one pass is completed by the next.
    iterations: usize,
}

impl Network {
    /// An unconfigured network. Training and evaluation report zero error,
    /// classification returns an empty vector.
    pub fn empty() -> Network {
        Network {
            chain: Chain::Empty,
            iterations: 0,
        }
    }

    /// Builds a network from an ordered chain of layers, input layer first.
    ///
    /// The chain must hold at least two layers, start with an input layer,
    /// and continue with dense layers whose `input_size` equals the size of
    /// their predecessor. Anything else is a construction error.
    pub fn new(layers: Vec<Layer>) -> Result<Network, NetworkError> {
        if layers.len() < 2 {
            return Err(NetworkError::TooFewLayers(layers.len()));
        }
        if !layers[0].is_input() {
            return Err(NetworkError::MissingInputLayer);
        }
        for (index, pair) in layers.windows(2).enumerate() {
            let expected = match pair[1].input_size() {
                Some(n) => n,
                None => return Err(NetworkError::MisplacedInputLayer(index + 1)),
            };
            if expected != pair[0].size() {
                return Err(NetworkError::ChainMismatch {
                    index: index + 1,
                    expected,
                    got: pair[0].size(),
                });
            }
        }

        Ok(Network {
            chain: Chain::Layers(layers),
            iterations: 0,
        })
    }

    /// Convenience constructor from the usual MLP description: an input
    /// width, an output width, the hidden widths in between, and one
    /// activation function per layer (`hidden.len() + 2` of them).
    pub fn from_topology(
        input: usize,
        output: usize,
        hidden: &[usize],
        functions: &[ActivationFunction],
    ) -> Result<Network, NetworkError> {
        let num_layers = hidden.len() + 2;
        if functions.len() != num_layers {
            return Err(NetworkError::ActivationCountMismatch {
                functions: functions.len(),
                layers: num_layers,
            });
        }

        let mut layers = Vec::with_capacity(num_layers);
        layers.push(Layer::input(input, functions[0])?);
        let mut prev = input;
        for (i, &width) in hidden.iter().enumerate() {
            layers.push(Layer::dense(width, prev, functions[i + 1])?);
            prev = width;
        }
        layers.push(Layer::dense(output, prev, functions[num_layers - 1])?);

        Network::new(layers)
    }

    /// Number of layers in the chain; 0 for an empty network.
    pub fn num_layers(&self) -> usize {
        match &self.chain {
            Chain::Empty => 0,
            Chain::Layers(layers) => layers.len(),
        }
    }

    /// Neuron count of the layer at `index`.
    pub fn layer_size(&self, index: usize) -> Option<usize> {
        match &self.chain {
            Chain::Empty => None,
            Chain::Layers(layers) => layers.get(index).map(Layer::size),
        }
    }

    /// Weight matrix of the layer at `index`; `None` for the input layer and
    /// out-of-range indices. Read-only diagnostics.
    pub fn weights(&self, index: usize) -> Option<&Matrix> {
        match &self.chain {
            Chain::Empty => None,
            Chain::Layers(layers) => layers.get(index).and_then(Layer::weights),
        }
    }

    /// Samples processed by batch training since construction or the last
    /// [`reset_iterations`](Network::reset_iterations).
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Resets the running batch counter, so the next
    /// [`train_batch`](Network::train_batch) call starts a fresh batch.
    pub fn reset_iterations(&mut self) {
        self.iterations = 0;
    }

    /// Runs a forward pass for `input` and returns the raw output-layer
    /// activations. No normalization is applied; any probability-like
    /// rescaling belongs to the caller, not the engine.
    pub fn classify(&mut self, input: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let layers = match &mut self.chain {
            Chain::Empty => return Ok(Vec::new()),
            Chain::Layers(layers) => layers,
        };

        layers[0].set_input(input)?;
        Self::forward(layers);
        Ok(layers[layers.len() - 1].output().to_vec())
    }

    /// Evaluates `data` without touching any weights and returns the mean
    /// squared, activation-derivative-weighted error `0.5 * Σ e² / n` with
    /// `e = (output - target) * derivative(pre_activation)` per output neuron.
    ///
    /// This is the same error term the backward pass starts from, not a raw
    /// MSE: where the output activation saturates the derivative shrinks, so
    /// the reported error can be small even while outputs and targets differ.
    /// Empty networks and empty datasets report 0.
    pub fn run_test(&mut self, data: &[Datum]) -> Result<f64, NetworkError> {
        let layers = match &mut self.chain {
            Chain::Empty => return Ok(0.0),
            Chain::Layers(layers) => layers,
        };
        if data.is_empty() {
            return Ok(0.0);
        }

        let mut total = 0.0;
        for datum in data {
            layers[0].set_input(datum.input())?;
            Self::forward(layers);
            for e in Self::output_error(&layers[layers.len() - 1], datum.target()) {
                total += e * e;
            }
        }
        Ok(0.5 * total / data.len() as f64)
    }

    /// One pass of per-sample training: every datum is forward-propagated,
    /// its output error backpropagated, and the weights stepped immediately.
    /// The momentum update is used iff `momentum > 0`. Returns the error of
    /// [`run_test`](Network::run_test) measured with the updated weights.
    pub fn train_online(
        &mut self,
        data: &[Datum],
        eta: f64,
        momentum: f64,
    ) -> Result<f64, NetworkError> {
        match &mut self.chain {
            Chain::Empty => return Ok(0.0),
            Chain::Layers(layers) => {
                for datum in data {
                    layers[0].set_input(datum.input())?;
                    Self::forward(layers);
                    let error = Self::output_error(&layers[layers.len() - 1], datum.target());
                    Self::backward(layers, error);
                    Self::apply_update(layers, eta, momentum);
                }
            }
        }

        let error = self.run_test(data)?;
        debug!(
            "online pass over {} samples done, error {error:.6}",
            data.len()
        );
        Ok(error)
    }

    /// One pass of batch training: gradients are accumulated for every datum,
    /// but the weights move only on every `batch_size`-th processed sample.
    ///
    /// The sample counter keeps running across calls, so when the dataset
    /// length is not a multiple of `batch_size` the remainder gradient is
    /// carried into the next call instead of being flushed. Use
    /// [`reset_iterations`](Network::reset_iterations) to start a fresh batch.
    /// Returns the error of [`run_test`](Network::run_test) after the pass.
    pub fn train_batch(
        &mut self,
        data: &[Datum],
        batch_size: usize,
        eta: f64,
        momentum: f64,
    ) -> Result<f64, NetworkError> {
        if batch_size == 0 {
            return Err(NetworkError::InvalidBatchSize);
        }

        match &mut self.chain {
            Chain::Empty => return Ok(0.0),
            Chain::Layers(layers) => {
                for datum in data {
                    layers[0].set_input(datum.input())?;
                    Self::forward(layers);
                    let error = Self::output_error(&layers[layers.len() - 1], datum.target());
                    Self::backward(layers, error);

                    self.iterations += 1;
                    if self.iterations % batch_size == 0 {
                        Self::apply_update(layers, eta, momentum);
                    }
                }
            }
        }

        let error = self.run_test(data)?;
        debug!(
            "batch pass over {} samples done (batch size {batch_size}, {} seen), error {error:.6}",
            data.len(),
            self.iterations
        );
        Ok(error)
    }

    /// Re-runs the whole chain front to back. The input layer's state was set
    /// by `set_input`; every other layer pulls its predecessor's output.
    fn forward(layers: &mut [Layer]) {
        for i in 1..layers.len() {
            let (front, back) = layers.split_at_mut(i);
            back[0].feed_from(front[i - 1].output());
        }
    }

    /// Error signal at the output layer: the output/target difference scaled
    /// by the activation derivative at the stored pre-activation sums.
    fn output_error(output_layer: &Layer, target: &[f64]) -> Vec<f64> {
        let mut error = vec![0.0; output_layer.size()];
        for (h, e) in error.iter_mut().enumerate() {
            *e = (output_layer.output()[h] - target[h])
                * output_layer
                    .activation()
                    .derivative(output_layer.pre_activation()[h]);
        }
        error
    }

    /// Walks the chain back to front, accumulating each layer's gradient and
    /// handing the propagated error signal to its predecessor. The input layer
    /// accumulates nothing, so the signal reaching it is never computed.
    fn backward(layers: &mut [Layer], mut error: Vec<f64>) {
        for i in (1..layers.len()).rev() {
            let (front, back) = layers.split_at_mut(i);
            let predecessor = &front[i - 1];
            back[0].accumulate_gradient(&error, predecessor.output());
            if i > 1 {
                error = back[0].propagate_error(&error, predecessor);
            }
        }
    }

    /// Steps every layer's weights from its accumulated gradient. The
    /// momentum entry point is taken iff `momentum > 0`.
    fn apply_update(layers: &mut [Layer], eta: f64, momentum: f64) {
        for layer in layers.iter_mut() {
            if momentum > 0.0 {
                layer.update_with_momentum(eta, momentum);
            } else {
                layer.update(eta);
            }
        }
    }
}

/// Dumps every layer's weight matrix. Human-readable diagnostics only.
impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chain {
            Chain::Empty => write!(f, "(empty network)"),
            Chain::Layers(layers) => {
                for (i, layer) in layers.iter().enumerate() {
                    writeln!(f, "layer {i}")?;
                    writeln!(f, "{layer}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Network;
    use crate::activation::activation::ActivationFunction::{Identity, Sigmoid};
    use crate::data::datum::Datum;
    use crate::layers::dense::Layer;
    use crate::network::error::NetworkError;

    fn xor_data() -> Vec<Datum> {
        vec![
            Datum::new(vec![1.0, 0.0], vec![1.0]),
            Datum::new(vec![0.0, 1.0], vec![1.0]),
            Datum::new(vec![0.0, 0.0], vec![0.0]),
            Datum::new(vec![1.0, 1.0], vec![0.0]),
        ]
    }

    fn small_net() -> Network {
        Network::from_topology(2, 1, &[4], &[Sigmoid, Sigmoid, Sigmoid]).unwrap()
    }

    #[test]
    fn empty_network_is_a_harmless_no_op() {
        let mut net = Network::empty();
        let data = xor_data();

        assert_eq!(net.num_layers(), 0);
        assert_eq!(net.run_test(&data), Ok(0.0));
        assert_eq!(net.train_online(&data, 0.1, 0.0), Ok(0.0));
        assert_eq!(net.train_batch(&data, 2, 0.1, 0.0), Ok(0.0));
        assert_eq!(net.classify(&[1.0, 0.0]), Ok(Vec::new()));
    }

    #[test]
    fn construction_rejects_bad_chains() {
        assert_eq!(
            Network::new(vec![]).unwrap_err(),
            NetworkError::TooFewLayers(0)
        );
        assert_eq!(
            Network::new(vec![Layer::input(2, Sigmoid).unwrap()]).unwrap_err(),
            NetworkError::TooFewLayers(1)
        );
        assert_eq!(
            Network::new(vec![
                Layer::dense(2, 2, Sigmoid).unwrap(),
                Layer::dense(1, 2, Sigmoid).unwrap(),
            ])
            .unwrap_err(),
            NetworkError::MissingInputLayer
        );
        assert_eq!(
            Network::new(vec![
                Layer::input(2, Sigmoid).unwrap(),
                Layer::input(2, Sigmoid).unwrap(),
            ])
            .unwrap_err(),
            NetworkError::MisplacedInputLayer(1)
        );
        assert_eq!(
            Network::new(vec![
                Layer::input(2, Sigmoid).unwrap(),
                Layer::dense(1, 3, Sigmoid).unwrap(),
            ])
            .unwrap_err(),
            NetworkError::ChainMismatch {
                index: 1,
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn from_topology_validates_the_activation_count() {
        assert_eq!(
            Network::from_topology(2, 1, &[4], &[Sigmoid, Sigmoid]).unwrap_err(),
            NetworkError::ActivationCountMismatch {
                functions: 2,
                layers: 3
            }
        );

        let net = Network::from_topology(2, 1, &[4], &[Sigmoid, Sigmoid, Sigmoid]).unwrap();
        assert_eq!(net.num_layers(), 3);
        assert_eq!(net.layer_size(0), Some(2));
        assert_eq!(net.layer_size(1), Some(4));
        assert_eq!(net.layer_size(2), Some(1));
        assert!(net.weights(0).is_none());
        assert!(net.weights(1).is_some());
    }

    #[test]
    fn classify_returns_raw_activations() {
        let mut net = small_net();

        let out = net.classify(&[1.0, 0.0]).unwrap();
        assert_eq!(out.len(), 1);
        // Sigmoid output, no rescaling.
        assert!(out[0] > 0.0 && out[0] < 1.0);

        // Repeating the pass with the same input and weights is exact.
        assert_eq!(net.classify(&[1.0, 0.0]).unwrap(), out);
    }

    #[test]
    fn classify_rejects_misshapen_input() {
        let mut net = small_net();
        assert_eq!(
            net.classify(&[1.0, 0.0, 0.0]).unwrap_err(),
            NetworkError::ShapeMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn run_test_is_non_negative_and_zero_on_empty_data() {
        let mut net = small_net();
        assert_eq!(net.run_test(&[]), Ok(0.0));
        assert!(net.run_test(&xor_data()).unwrap() >= 0.0);
    }

    #[test]
    fn online_training_moves_the_weights() {
        let mut net = small_net();
        let before = net.weights(1).unwrap().clone();

        net.train_online(&xor_data(), 0.5, 0.0).unwrap();
        assert_ne!(net.weights(1), Some(&before));
    }

    #[test]
    fn zero_eta_training_leaves_weights_in_place() {
        let mut net = small_net();
        let hidden = net.weights(1).unwrap().clone();
        let output = net.weights(2).unwrap().clone();

        net.train_online(&xor_data(), 0.0, 0.0).unwrap();
        assert_eq!(net.weights(1), Some(&hidden));
        assert_eq!(net.weights(2), Some(&output));
    }

    #[test]
    fn batch_size_zero_is_rejected() {
        let mut net = small_net();
        assert_eq!(
            net.train_batch(&xor_data(), 0, 0.1, 0.0).unwrap_err(),
            NetworkError::InvalidBatchSize
        );
    }

    #[test]
    fn batch_counter_carries_across_calls() {
        let mut net = small_net();
        let data = xor_data();
        let before = net.weights(1).unwrap().clone();

        // 4 samples against a batch of 5: no update yet, gradient kept.
        net.train_batch(&data, 5, 0.5, 0.0).unwrap();
        assert_eq!(net.iterations(), 4);
        assert_eq!(net.weights(1), Some(&before));

        // The fifth sample of the second call completes the batch.
        net.train_batch(&data, 5, 0.5, 0.0).unwrap();
        assert_eq!(net.iterations(), 8);
        assert_ne!(net.weights(1), Some(&before));
    }

    #[test]
    fn reset_iterations_starts_a_fresh_batch() {
        let mut net = small_net();
        net.train_batch(&xor_data(), 5, 0.1, 0.0).unwrap();
        assert_eq!(net.iterations(), 4);

        net.reset_iterations();
        assert_eq!(net.iterations(), 0);
    }

    #[test]
    fn weight_dump_mentions_every_layer() {
        let net = small_net();
        let dump = format!("{net}");
        assert!(dump.contains("layer 0"));
        assert!(dump.contains("layer 2"));
        assert!(dump.contains("neuron [0]"));
    }

    #[test]
    fn identity_output_layer_reports_plain_squared_error() {
        // With identity activations throughout, the derivative factor is 1 and
        // run_test reduces to 0.5 * MSE against the linear outputs.
        let mut net = Network::from_topology(1, 1, &[], &[Identity, Identity]).unwrap();
        let w = net.weights(1).unwrap().data[0][0];
        let data = vec![Datum::new(vec![1.0], vec![0.0])];

        let expected = 0.5 * w * w;
        let got = net.run_test(&data).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }
}
