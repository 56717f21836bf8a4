pub mod datum;

pub use datum::Datum;
