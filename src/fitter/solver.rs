//! Settings for the `levenberg-marquardt` minimiser and helpers to read its
//! termination reasons.

use levenberg_marquardt::{LevenbergMarquardt, TerminationReason};

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Relative reduction of the sum of squares below which the fit stops.
    pub ftol: f64,
    /// Relative step size below which the fit stops.
    pub xtol: f64,
    /// Cosine between residuals and Jacobian columns below which the fit stops.
    pub gtol: f64,
    /// Initial step bound, in units of the scaled parameter vector.
    pub stepbound: f64,
    /// Evaluation budget is `patience * (n + 1)` for `n` free parameters.
    pub patience: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 0.0,
            stepbound: 100.0,
            patience: 200,
        }
    }
}

impl SolverSettings {
    pub fn levenberg_marquardt(&self) -> LevenbergMarquardt<f64> {
        LevenbergMarquardt::new()
            .with_ftol(self.ftol)
            .with_xtol(self.xtol)
            .with_gtol(self.gtol)
            .with_stepbound(self.stepbound)
            .with_patience(self.patience)
    }
}

/// True when the minimiser stopped at a solution. A problem with nothing to
/// vary is already at its solution.
pub fn converged(termination: &TerminationReason) -> bool {
    termination.was_successful() || matches!(termination, TerminationReason::NoParameters)
}

pub fn describe(termination: &TerminationReason) -> String {
    match termination {
        TerminationReason::ResidualsZero => "residuals are exactly zero".to_owned(),
        TerminationReason::Orthogonal => "residuals are orthogonal to the jacobian".to_owned(),
        TerminationReason::Converged { ftol, xtol } => match (*ftol, *xtol) {
            (true, true) => "both ftol and xtol are satisfied".to_owned(),
            (true, false) => "relative reduction of the sum of squares is below ftol".to_owned(),
            _ => "relative step size is below xtol".to_owned(),
        },
        TerminationReason::NoParameters => "no parameter is allowed to vary".to_owned(),
        TerminationReason::LostPatience => "reached the limit of function evaluations".to_owned(),
        other => format!("{other:?}"),
    }
}
