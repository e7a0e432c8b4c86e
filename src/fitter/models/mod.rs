pub mod gaussian;
pub mod linear;

use crate::error::FitError;
use crate::fitter::common::{
    OFFSET_NAME, ParameterVector, SLOPE_NAME, amplitude_name, centroid_name, width_name,
};
use gaussian::Gaussian;
use linear::LinearBackground;

/// Sum of Gaussian components on top of a linear background:
///
/// `y(x) = Σ amp_i · exp(−(x − cen_i)² / (2·wid_i²)) + line_off + line_slope·x`
#[derive(Default, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PeakModel {
    pub peaks: Vec<Gaussian>,
    pub background: LinearBackground,
}

impl PeakModel {
    pub fn new(peaks: Vec<Gaussian>, background: LinearBackground) -> Self {
        Self { peaks, background }
    }

    pub fn from_params(params: &ParameterVector) -> Result<Self, FitError> {
        let peaks = (0..params.peak_count())
            .map(|i| {
                Ok(Gaussian::new(
                    params.value(&amplitude_name(i))?,
                    params.value(&centroid_name(i))?,
                    params.value(&width_name(i))?,
                ))
            })
            .collect::<Result<Vec<_>, FitError>>()?;

        let background =
            LinearBackground::new(params.value(SLOPE_NAME)?, params.value(OFFSET_NAME)?);

        Ok(Self { peaks, background })
    }

    /// Parameter names in the order `gradient` reports its entries.
    pub fn slot_names(peak_count: usize) -> Vec<String> {
        let mut names = Vec::with_capacity(3 * peak_count + 2);
        for i in 0..peak_count {
            names.push(amplitude_name(i));
            names.push(centroid_name(i));
            names.push(width_name(i));
        }
        names.push(SLOPE_NAME.to_owned());
        names.push(OFFSET_NAME.to_owned());
        names
    }

    pub fn parameter_count(&self) -> usize {
        3 * self.peaks.len() + 2
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.peaks.iter().map(|peak| peak.evaluate(x)).sum::<f64>() + self.background.evaluate(x)
    }

    pub fn evaluate_many(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&x| self.evaluate(x)).collect()
    }

    pub fn background_only(&self, x: &[f64]) -> Vec<f64> {
        self.background.calculate_background(x)
    }

    /// Gradient of the model at `x`, laid out like [`Self::slot_names`].
    pub fn gradient(&self, x: f64) -> Vec<f64> {
        let mut gradient = Vec::with_capacity(self.parameter_count());
        for peak in &self.peaks {
            gradient.extend_from_slice(&peak.gradient(x));
        }
        gradient.extend_from_slice(&LinearBackground::gradient(x));
        gradient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitter::common::Parameter;
    use approx::assert_relative_eq;

    fn params_for(peaks: &[(f64, f64, f64)], slope: f64, offset: f64) -> ParameterVector {
        let mut params = ParameterVector::new();
        for (i, &(amp, cen, wid)) in peaks.iter().enumerate() {
            params.add(Parameter::new(amplitude_name(i), amp)).unwrap();
            params.add(Parameter::new(centroid_name(i), cen)).unwrap();
            params.add(Parameter::new(width_name(i), wid)).unwrap();
        }
        params.add(Parameter::new(SLOPE_NAME, slope)).unwrap();
        params.add(Parameter::new(OFFSET_NAME, offset)).unwrap();
        params
    }

    #[test]
    fn zero_amplitudes_reduce_to_background() {
        for n in 0..4 {
            let peaks: Vec<_> = (0..n).map(|i| (0.0, 10.0 * i as f64, 1.5)).collect();
            let model = PeakModel::from_params(&params_for(&peaks, 0.3, -2.0)).unwrap();
            for x in [-5.0, 0.0, 0.25, 10.0, 33.3] {
                assert_eq!(model.evaluate(x), -2.0 + 0.3 * x);
            }
        }
    }

    #[test]
    fn no_peaks_is_a_line() {
        let model = PeakModel::from_params(&params_for(&[], 2.0, 1.0)).unwrap();
        assert!(model.peaks.is_empty());
        assert_eq!(model.evaluate_many(&[0.0, 1.0, 2.0]), vec![1.0, 3.0, 5.0]);
        assert_eq!(model.gradient(4.0), vec![4.0, 1.0]);
    }

    #[test]
    fn evaluates_between_samples() {
        let model = PeakModel::from_params(&params_for(&[(100.0, 50.0, 3.0)], 0.1, 5.0)).unwrap();
        let expected = 100.0 * (-(0.05_f64.powi(2)) / 18.0).exp() + 5.0 + 0.1 * 50.05;
        assert_relative_eq!(model.evaluate(50.05), expected, epsilon = 1e-12);
    }

    #[test]
    fn missing_background_parameter_is_reported() {
        let mut params = ParameterVector::new();
        params.add(Parameter::new(SLOPE_NAME, 0.0)).unwrap();
        let err = PeakModel::from_params(&params).unwrap_err();
        assert_eq!(err, FitError::MissingParameter(OFFSET_NAME.to_owned()));
    }

    #[test]
    fn slot_names_follow_gradient_layout() {
        assert_eq!(
            PeakModel::slot_names(1),
            vec!["amp_0", "cen_0", "wid_0", "line_slope", "line_off"]
        );
    }
}
