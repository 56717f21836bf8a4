use std::f64::consts::E;

/// Per-neuron activation function, chosen per layer at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationFunction {
    Sigmoid,
    Tanh,
    Identity,
}

impl ActivationFunction {
    /// Element-wise activation of a pre-activation sum.
    pub fn compute(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative evaluated at the same pre-activation sum `x` that produced
    /// the output. Backpropagation feeds the stored pre-activation values in
    /// here, so the derivative must never be phrased in terms of the activated
    /// output.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let e = E.powf(x);
                e / ((e + 1.0) * (e + 1.0))
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Identity => 1.0,
        }
    }
}
