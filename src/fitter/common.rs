use crate::error::FitError;

/// One contiguous slice of a histogram: strictly increasing `x` and the
/// counts `y` observed at each `x`.
#[derive(PartialEq, Default, Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Observation {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Observation {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, FitError> {
        if x.len() != y.len() {
            return Err(FitError::InvalidObservation(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }

        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FitError::InvalidObservation(format!(
                "x is not strictly increasing at index {}",
                i + 1
            )));
        }

        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::InvalidObservation(
                "x and y must be finite".to_owned(),
            ));
        }

        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// First and last x value, if any.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        Some((*self.x.first()?, *self.x.last()?))
    }

    /// Sub-observation with `lo <= x <= hi`. The bounds may be given in either order.
    pub fn slice_range(&self, lo: f64, hi: f64) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };

        let (x, y) = self
            .x
            .iter()
            .zip(self.y.iter())
            .filter(|&(&x, _)| x >= lo && x <= hi)
            .map(|(&x, &y)| (x, y))
            .unzip();

        Self { x, y }
    }
}

/// Seed for one Gaussian component, taken from a marked point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Peak {
    pub centroid: f64,
    pub amplitude: f64,
}

impl Peak {
    pub fn new(centroid: f64, amplitude: f64) -> Self {
        Self {
            centroid,
            amplitude,
        }
    }
}

impl std::fmt::Display for Peak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Peak(cen={:.2}, amp={:.2})", self.centroid, self.amplitude)
    }
}

#[derive(PartialEq, Debug, Clone, Copy, Default, serde::Deserialize, serde::Serialize)]
pub struct Value {
    pub value: f64,
    pub uncertainty: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub vary: bool,
    pub uncertainty: Option<f64>,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            value: 0.0,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            vary: true,
            uncertainty: None,
        }
    }
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            ..Default::default()
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.vary = false;
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_finite() || self.max.is_finite()
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

pub fn amplitude_name(i: usize) -> String {
    format!("amp_{i}")
}

pub fn centroid_name(i: usize) -> String {
    format!("cen_{i}")
}

pub fn width_name(i: usize) -> String {
    format!("wid_{i}")
}

pub const SLOPE_NAME: &str = "line_slope";
pub const OFFSET_NAME: &str = "line_off";

/// Ordered, name-unique collection of fit parameters.
///
/// For N peaks it holds `amp_i, cen_i, wid_i` for every `i < N` followed by
/// `line_slope` and `line_off`.
#[derive(PartialEq, Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct ParameterVector {
    params: Vec<Parameter>,
}

impl ParameterVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, param: Parameter) -> Result<(), FitError> {
        if self.get(&param.name).is_some() {
            return Err(FitError::DuplicateParameter(param.name));
        }
        self.params.push(param);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Result<f64, FitError> {
        self.get(name)
            .map(|p| p.value)
            .ok_or_else(|| FitError::MissingParameter(name.to_owned()))
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), FitError> {
        let param = self
            .get_mut(name)
            .ok_or_else(|| FitError::MissingParameter(name.to_owned()))?;
        param.value = value;
        Ok(())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn as_slice(&self) -> &[Parameter] {
        &self.params
    }

    pub fn as_mut_slice(&mut self) -> &mut [Parameter] {
        &mut self.params
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Parameter> {
        self.params.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of Gaussian components, counted from the `amp_<i>` entries.
    pub fn peak_count(&self) -> usize {
        (0..)
            .take_while(|&i| self.get(&amplitude_name(i)).is_some())
            .count()
    }

    pub fn varying_count(&self) -> usize {
        self.params.iter().filter(|p| p.vary).count()
    }
}

/// Keeps the first parameter of every name; later duplicates are dropped.
impl FromIterator<Parameter> for ParameterVector {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut params = Self::new();
        for param in iter {
            if let Err(e) = params.add(param) {
                log::warn!("{e}, keeping the first definition");
            }
        }
        params
    }
}

impl<'a> IntoIterator for &'a ParameterVector {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_rejects_unsorted_x() {
        let result = Observation::new(vec![0.0, 2.0, 1.0], vec![1.0, 1.0, 1.0]);
        assert!(matches!(result, Err(FitError::InvalidObservation(_))));
    }

    #[test]
    fn observation_rejects_length_mismatch() {
        let result = Observation::new(vec![0.0, 1.0], vec![1.0]);
        assert!(matches!(result, Err(FitError::InvalidObservation(_))));
    }

    #[test]
    fn slice_range_is_inclusive_and_order_free() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        let obs = Observation::new(x, y).unwrap();

        let slice = obs.slice_range(7.0, 3.0);
        assert_eq!(slice.x(), &[3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(slice.y(), &[6.0, 8.0, 10.0, 12.0, 14.0]);
    }

    #[test]
    fn parameter_names_are_unique() {
        let mut params = ParameterVector::new();
        params.add(Parameter::new("amp_0", 1.0)).unwrap();
        let err = params.add(Parameter::new("amp_0", 2.0)).unwrap_err();
        assert_eq!(err, FitError::DuplicateParameter("amp_0".to_owned()));
        assert_eq!(params.len(), 1);
        assert_eq!(params.value("amp_0").unwrap(), 1.0);
    }

    #[test]
    fn peak_count_follows_amplitude_entries() {
        let mut params = ParameterVector::new();
        for i in 0..3 {
            params.add(Parameter::new(amplitude_name(i), 1.0)).unwrap();
            params.add(Parameter::new(centroid_name(i), 1.0)).unwrap();
            params.add(Parameter::new(width_name(i), 1.0)).unwrap();
        }
        params.add(Parameter::new(SLOPE_NAME, 0.0)).unwrap();
        params.add(Parameter::new(OFFSET_NAME, 0.0)).unwrap();
        assert_eq!(params.peak_count(), 3);
        assert_eq!(params.varying_count(), 11);
    }

    #[test]
    fn clamp_respects_bounds() {
        let p = Parameter::new("wid_0", 1.0).with_bounds(0.5, 4.0);
        assert_eq!(p.clamp(0.1), 0.5);
        assert_eq!(p.clamp(9.0), 4.0);
        assert_eq!(p.clamp(2.0), 2.0);
        assert!(p.is_bounded());
    }
}
