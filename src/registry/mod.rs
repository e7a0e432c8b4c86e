pub mod curve_registry;
pub mod selection;

pub use curve_registry::{CurveRegistry, NamedCurve, RegistryId};
pub use selection::{Selection, SelectionTracker};
