pub mod spectrum;

pub use spectrum::{GateInfo, GateKind, Spectrum};
