#![warn(clippy::all, rust_2018_idioms)]

//! Interactive gamma-spectrum viewer core: mark a fit range and peak seeds
//! on a plotted spectrum, fit a sum of Gaussians on a linear background and
//! keep the drawn spectra and fit curves addressable by name.

pub mod capture;
pub mod data;
pub mod error;
pub mod fitter;
pub mod plot;
pub mod registry;
pub mod settings;
pub mod viewer;

pub use capture::{FitSeed, PointCapture};
pub use data::Spectrum;
pub use error::ViewerError;
pub use fitter::common::{Observation, Parameter, ParameterVector, Peak};
pub use fitter::fit_engine::{FitEngine, FitResult};
pub use plot::{CurveHandle, PlotSurface, Renderer};
pub use registry::{CurveRegistry, SelectionTracker};
pub use settings::Settings;
pub use viewer::{Viewer, ViewerEvent};
