use levenberg_marquardt::LeastSquaresProblem;
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn};

use super::common::{
    OFFSET_NAME, Observation, Parameter, ParameterVector, Peak, SLOPE_NAME, Value,
    amplitude_name, centroid_name, width_name,
};
use super::solver::{self, SolverSettings};
use super::models::PeakModel;
use super::models::gaussian::GaussianParams;
use super::models::linear::LinearBackground;
use super::report;
use crate::error::FitError;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitStatistics {
    pub ndata: usize,
    pub nvarys: usize,
    pub nfev: usize,
    pub chisqr: f64,
    /// `chisqr / (ndata - nvarys)`, `None` without degrees of freedom.
    pub redchi: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct FitResult {
    /// Value of the fit counter when this fit ran.
    pub fit_index: usize,
    pub init_params: ParameterVector,
    pub params: ParameterVector,
    /// Covariance of the varying parameters, ordered like `covariance_names`.
    pub covariance: Option<DMatrix<f64>>,
    pub covariance_names: Vec<String>,
    pub succeeded: bool,
    pub message: String,
    pub statistics: FitStatistics,
    failure: Option<FitError>,
}

impl FitResult {
    fn failed(fit_index: usize, params: ParameterVector, ndata: usize, error: FitError) -> Self {
        log::warn!("Fit {fit_index} failed: {error}");
        Self {
            fit_index,
            init_params: params.clone(),
            statistics: FitStatistics {
                ndata,
                nvarys: params.varying_count(),
                ..Default::default()
            },
            params,
            covariance: None,
            covariance_names: Vec::new(),
            succeeded: false,
            message: error.to_string(),
            failure: Some(error),
        }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.params.get(name).map(|p| p.value)
    }

    pub fn uncertainty(&self, name: &str) -> Option<f64> {
        self.params.get(name).and_then(|p| p.uncertainty)
    }

    pub fn peak_count(&self) -> usize {
        self.params.peak_count()
    }

    pub fn model(&self) -> Result<PeakModel, FitError> {
        PeakModel::from_params(&self.params)
    }

    pub fn background(&self) -> Result<LinearBackground, FitError> {
        Ok(self.model()?.background)
    }

    /// Fitted components with FWHM and area.
    pub fn peaks(&self) -> Vec<GaussianParams> {
        let value = |name: String| {
            self.params.get(&name).map(|p| Value {
                value: p.value,
                uncertainty: p.uncertainty,
            })
        };

        (0..self.peak_count())
            .filter_map(|i| {
                Some(GaussianParams::new(
                    value(amplitude_name(i))?,
                    value(centroid_name(i))?,
                    value(width_name(i))?,
                ))
            })
            .collect()
    }

    /// Turns an unsuccessful fit into the error that stopped it.
    pub fn into_result(self) -> Result<Self, FitError> {
        if self.succeeded {
            return Ok(self);
        }
        Err(self
            .failure
            .clone()
            .unwrap_or_else(|| FitError::Convergence(self.message.clone())))
    }
}

struct PeakProblem<'a> {
    observation: &'a Observation,
    params: ParameterVector,
    /// Positions of the varying parameters in `params`.
    free: Vec<usize>,
    /// Gradient slot of every entry of `params`.
    slots: Vec<usize>,
}

impl PeakProblem<'_> {
    fn model(&self) -> Option<PeakModel> {
        PeakModel::from_params(&self.params).ok()
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for PeakProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    /// Trial values outside a parameter's bounds are moved onto the bound.
    fn set_params(&mut self, params: &DVector<f64>) {
        let all = self.params.as_mut_slice();
        for (&index, &value) in self.free.iter().zip(params.iter()) {
            all[index].value = all[index].clamp(value);
        }
    }

    fn params(&self) -> DVector<f64> {
        let all = self.params.as_slice();
        DVector::from_iterator(self.free.len(), self.free.iter().map(|&i| all[i].value))
    }

    /// `None` once any residual is non-finite, which stops the minimiser.
    fn residuals(&self) -> Option<DVector<f64>> {
        let model = self.model()?;
        let obs = self.observation;
        let residuals = DVector::from_iterator(
            obs.len(),
            obs.x()
                .iter()
                .zip(obs.y().iter())
                .map(|(&x, &y)| model.evaluate(x) - y),
        );
        residuals.iter().all(|r| r.is_finite()).then_some(residuals)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let model = self.model()?;
        let mut jacobian = DMatrix::zeros(self.observation.len(), self.free.len());
        for (row, &x) in self.observation.x().iter().enumerate() {
            let gradient = model.gradient(x);
            for (col, &index) in self.free.iter().enumerate() {
                jacobian[(row, col)] = gradient[self.slots[index]];
            }
        }
        Some(jacobian)
    }
}

/// Fits the multi-Gaussian plus linear background model to observations.
///
/// The engine keeps no state between fits apart from the fit counter, which
/// advances once for every successful fit and is used to name fit curves.
#[derive(Debug, Clone, Default)]
pub struct FitEngine {
    pub solver: SolverSettings,
    ith_fit: usize,
}

impl FitEngine {
    pub fn new(solver: SolverSettings) -> Self {
        Self { solver, ith_fit: 0 }
    }

    pub fn ith_fit(&self) -> usize {
        self.ith_fit
    }

    /// Seeds `amp_i`/`cen_i` from the peaks, `wid_i = default_width` and a flat zero background.
    pub fn initialize(peaks: &[Peak], default_width: f64) -> ParameterVector {
        peaks
            .iter()
            .enumerate()
            .flat_map(|(i, peak)| {
                [
                    Parameter::new(amplitude_name(i), peak.amplitude),
                    Parameter::new(centroid_name(i), peak.centroid),
                    Parameter::new(width_name(i), default_width),
                ]
            })
            .chain([
                Parameter::new(SLOPE_NAME, 0.0),
                Parameter::new(OFFSET_NAME, 0.0),
            ])
            .collect()
    }

    /// Same as [`Self::initialize`] with every width limited to `[min, max]`.
    pub fn initialize_with_width_bounds(
        peaks: &[Peak],
        default_width: f64,
        min: f64,
        max: f64,
    ) -> ParameterVector {
        let mut params = Self::initialize(peaks, default_width);
        for i in 0..peaks.len() {
            if let Some(width) = params.get_mut(&width_name(i)) {
                width.min = min;
                width.max = max;
                width.value = width.clamp(width.value);
            }
        }
        params
    }

    pub fn evaluate(params: &ParameterVector, x: &[f64]) -> Result<Vec<f64>, FitError> {
        Ok(PeakModel::from_params(params)?.evaluate_many(x))
    }

    /// Evaluates the model on `x_first, x_first + step, …` up to (excluding) the
    /// last x of the observation.
    pub fn resample(
        params: &ParameterVector,
        observation: &Observation,
        step: f64,
    ) -> Result<(Vec<f64>, Vec<f64>), FitError> {
        if step.is_nan() || step <= 0.0 {
            return Err(FitError::DegenerateInput(format!(
                "resampling step must be positive, got {step}"
            )));
        }
        let (start, end) = observation
            .x_range()
            .ok_or_else(|| FitError::DegenerateInput("observation is empty".to_owned()))?;

        let count = ((end - start) / step).ceil().max(0.0) as usize;
        let x: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
        let y = Self::evaluate(params, &x)?;
        Ok((x, y))
    }

    pub fn report(result: &FitResult) -> String {
        report::fit_report(result)
    }

    fn check_input(params: &ParameterVector, observation: &Observation) -> Result<Vec<usize>, FitError> {
        if observation.len() < 2 {
            return Err(FitError::DegenerateInput(format!(
                "{} data points in the fit range, at least 2 are needed",
                observation.len()
            )));
        }

        let slot_names = PeakModel::slot_names(params.peak_count());
        let slots = params
            .names()
            .map(|name| {
                slot_names
                    .iter()
                    .position(|slot| slot == name)
                    .ok_or_else(|| FitError::DegenerateInput(format!("unknown parameter {name}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        PeakModel::from_params(params)?;

        if let Some(p) = params.iter().find(|p| !p.value.is_finite()) {
            return Err(FitError::DegenerateInput(format!(
                "initial value of {} is not finite",
                p.name
            )));
        }

        let nvarys = params.varying_count();
        if observation.len() < nvarys {
            return Err(FitError::DegenerateInput(format!(
                "{} data points for {nvarys} free parameters",
                observation.len()
            )));
        }

        Ok(slots)
    }

    pub fn fit(&mut self, mut params: ParameterVector, observation: &Observation) -> FitResult {
        let fit_index = self.ith_fit;

        let slots = match Self::check_input(&params, observation) {
            Ok(slots) => slots,
            Err(e) => return FitResult::failed(fit_index, params, observation.len(), e),
        };

        for param in params.iter_mut() {
            param.value = param.clamp(param.value);
            param.uncertainty = None;
        }
        let init_params = params.clone();

        let free: Vec<usize> = params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.vary)
            .map(|(i, _)| i)
            .collect();

        log::info!(
            "Fitting {} peaks to {} points with {} free parameters",
            params.peak_count(),
            observation.len(),
            free.len()
        );

        let problem = PeakProblem {
            observation,
            params,
            free,
            slots,
        };
        let (problem, solver_report) = self.solver.levenberg_marquardt().minimize(problem);
        let termination = solver::describe(&solver_report.termination);
        log::debug!(
            "Minimiser stopped after {} evaluations: {termination}",
            solver_report.number_of_evaluations
        );

        let mut statistics = FitStatistics {
            ndata: observation.len(),
            nvarys: problem.free.len(),
            nfev: solver_report.number_of_evaluations,
            chisqr: problem
                .residuals()
                .map_or(f64::NAN, |r| r.norm_squared()),
            redchi: None,
        };
        let dof = statistics.ndata - statistics.nvarys;
        if dof > 0 {
            statistics.redchi = Some(statistics.chisqr / dof as f64);
        }

        let covariance = problem
            .jacobian()
            .and_then(|j| j.tr_mul(&j).try_inverse())
            .map(|cov| cov * statistics.redchi.unwrap_or(1.0));

        let PeakProblem {
            mut params, free, ..
        } = problem;
        let covariance_names: Vec<String> = free
            .iter()
            .map(|&i| params.as_slice()[i].name.clone())
            .collect();

        let mut notes = Vec::new();
        let mut failure = None;

        if !solver::converged(&solver_report.termination) {
            failure = Some(FitError::Convergence(termination.clone()));
        }

        if let Some(p) = params.iter().find(|p| !p.value.is_finite()) {
            failure = Some(FitError::Convergence(format!("{} is not finite", p.name)));
        }

        for i in 0..params.peak_count() {
            let Some(width) = params.get_mut(&width_name(i)) else {
                continue;
            };
            if width.value == 0.0 {
                failure = Some(FitError::Convergence(format!("{} collapsed to zero", width.name)));
            } else if width.value < 0.0 {
                width.value = -width.value;
                notes.push(format!("{} converged negative and is reported as |{}|", width.name, width.name));
            }
        }

        match &covariance {
            Some(cov) => {
                for (k, name) in covariance_names.iter().enumerate() {
                    if let Some(param) = params.get_mut(name) {
                        let variance = cov[(k, k)];
                        param.uncertainty = (variance >= 0.0).then_some(variance.sqrt());
                    }
                }
            }
            None if !covariance_names.is_empty() => {
                notes.push("uncertainties could not be estimated".to_owned());
            }
            None => {}
        }

        let succeeded = failure.is_none();
        let mut message = match &failure {
            Some(e) => e.to_string(),
            None => format!("Fit succeeded: {termination}"),
        };
        for note in &notes {
            message.push_str("; ");
            message.push_str(note);
        }

        if succeeded {
            self.ith_fit += 1;
            log::info!("Fit {fit_index} succeeded, chi-square {:.4e}", statistics.chisqr);
        } else {
            log::warn!("Fit {fit_index} failed: {message}");
        }

        FitResult {
            fit_index,
            init_params,
            params,
            covariance: if succeeded { covariance } else { None },
            covariance_names,
            succeeded,
            message,
            statistics,
            failure,
        }
    }
}
