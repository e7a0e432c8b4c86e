use crate::fitter::common::Value;

const FWHM_FACTOR: f64 = 2.354_820_045_030_949_4; // 2 * sqrt(2 ln 2)

#[derive(Default, Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Gaussian {
    pub amplitude: f64,
    pub centroid: f64,
    pub width: f64,
}

impl Gaussian {
    pub fn new(amplitude: f64, centroid: f64, width: f64) -> Self {
        Self {
            amplitude,
            centroid,
            width,
        }
    }

    fn shape(&self, x: f64) -> f64 {
        (-((x - self.centroid).powi(2)) / (2.0 * self.width.powi(2))).exp()
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.amplitude * self.shape(x)
    }

    /// Partial derivatives at `x` with respect to amplitude, centroid and width.
    pub fn gradient(&self, x: f64) -> [f64; 3] {
        let g = self.shape(x);
        let dx = x - self.centroid;
        let w2 = self.width.powi(2);

        [
            g,
            self.amplitude * g * dx / w2,
            self.amplitude * g * dx.powi(2) / (w2 * self.width),
        ]
    }

    pub fn fwhm(&self) -> f64 {
        FWHM_FACTOR * self.width
    }

    pub fn area(&self) -> f64 {
        self.amplitude * self.width * (2.0 * std::f64::consts::PI).sqrt()
    }
}

/// Quantities derived from one fitted component, with propagated uncertainties.
#[derive(Default, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GaussianParams {
    pub amplitude: Value,
    pub centroid: Value,
    pub width: Value,
    pub fwhm: Value,
    pub area: Value,
}

impl GaussianParams {
    pub fn new(amplitude: Value, centroid: Value, width: Value) -> Self {
        let gaussian = Gaussian::new(amplitude.value, centroid.value, width.value);

        let fwhm = Value {
            value: gaussian.fwhm(),
            uncertainty: width.uncertainty.map(|dw| FWHM_FACTOR * dw),
        };

        let two_pi_sqrt = (2.0 * std::f64::consts::PI).sqrt();
        let area_uncertainty = match (amplitude.uncertainty, width.uncertainty) {
            (Some(da), Some(dw)) => Some(
                ((width.value * two_pi_sqrt * da).powi(2)
                    + (amplitude.value * two_pi_sqrt * dw).powi(2))
                .sqrt(),
            ),
            _ => None,
        };

        Self {
            amplitude,
            centroid,
            width,
            fwhm,
            area: Value {
                value: gaussian.area(),
                uncertainty: area_uncertainty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn peak_value_at_centroid_is_amplitude() {
        let g = Gaussian::new(100.0, 50.0, 3.0);
        assert_relative_eq!(g.evaluate(50.0), 100.0);
        assert_relative_eq!(g.evaluate(53.0), 100.0 * (-0.5_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let g = Gaussian::new(40.0, 10.0, 2.5);
        let x = 11.3;
        let h = 1e-6;
        let grad = g.gradient(x);

        let da = (Gaussian::new(40.0 + h, 10.0, 2.5).evaluate(x)
            - Gaussian::new(40.0 - h, 10.0, 2.5).evaluate(x))
            / (2.0 * h);
        let dc = (Gaussian::new(40.0, 10.0 + h, 2.5).evaluate(x)
            - Gaussian::new(40.0, 10.0 - h, 2.5).evaluate(x))
            / (2.0 * h);
        let dw = (Gaussian::new(40.0, 10.0, 2.5 + h).evaluate(x)
            - Gaussian::new(40.0, 10.0, 2.5 - h).evaluate(x))
            / (2.0 * h);

        assert_relative_eq!(grad[0], da, epsilon = 1e-6);
        assert_relative_eq!(grad[1], dc, epsilon = 1e-6);
        assert_relative_eq!(grad[2], dw, epsilon = 1e-6);
    }

    #[test]
    fn derived_quantities() {
        let params = GaussianParams::new(
            Value {
                value: 10.0,
                uncertainty: Some(1.0),
            },
            Value {
                value: 5.0,
                uncertainty: Some(0.1),
            },
            Value {
                value: 2.0,
                uncertainty: Some(0.2),
            },
        );
        assert_relative_eq!(params.fwhm.value, 4.709_640_090_061_899, epsilon = 1e-9);
        assert_relative_eq!(
            params.area.value,
            20.0 * (2.0 * std::f64::consts::PI).sqrt(),
            epsilon = 1e-9
        );
        assert!(params.area.uncertainty.is_some());
    }
}
