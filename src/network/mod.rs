pub mod error;
pub mod network;

pub use error::NetworkError;
pub use network::Network;
