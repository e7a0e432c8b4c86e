pub mod renderer;
pub mod style;
pub mod surface;

pub use renderer::{CurveHandle, Renderer};
pub use style::CurveStyle;
pub use surface::PlotSurface;
