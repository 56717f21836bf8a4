pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod data;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use network::error::NetworkError;
pub use data::datum::Datum;
