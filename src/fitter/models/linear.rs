#[derive(Default, Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearBackground {
    pub slope: f64,
    pub offset: f64,
}

impl LinearBackground {
    pub fn new(slope: f64, offset: f64) -> Self {
        Self { slope, offset }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.offset + self.slope * x
    }

    /// Partial derivatives with respect to slope and offset.
    pub fn gradient(x: f64) -> [f64; 2] {
        [x, 1.0]
    }

    pub fn calculate_background(&self, x_data: &[f64]) -> Vec<f64> {
        x_data.iter().map(|&x| self.evaluate(x)).collect()
    }
}
