pub mod fit_seed;
pub mod overlay;
pub mod point_capture;

pub use fit_seed::FitSeed;
pub use point_capture::{CaptureLock, CaptureMode, CaptureState, PointCapture};
