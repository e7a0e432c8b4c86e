use crate::error::CaptureError;
use crate::fitter::common::Peak;

/// Fit range and peak seeds taken from a committed fit marking.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FitSeed {
    pub range: (f64, f64),
    pub peaks: Vec<Peak>,
}

impl FitSeed {
    /// The first and last point bound the range; every point in between seeds one peak.
    pub fn from_points(points: &[[f64; 2]]) -> Result<Self, CaptureError> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Err(CaptureError::NoPoints);
        };
        if points.len() < 2 {
            return Err(CaptureError::NotEnoughPoints {
                needed: 2,
                found: points.len(),
            });
        }

        let peaks: Vec<Peak> = points[1..points.len() - 1]
            .iter()
            .map(|&[x, y]| Peak::new(x, y))
            .collect();
        if peaks.is_empty() {
            log::warn!("No peaks marked inside the fit range, fitting the background only");
        }

        Ok(Self {
            range: (first[0], last[0]),
            peaks,
        })
    }

    /// Range bounds in increasing order.
    pub fn bounds(&self) -> (f64, f64) {
        let (a, b) = self.range;
        if a <= b { (a, b) } else { (b, a) }
    }
}
