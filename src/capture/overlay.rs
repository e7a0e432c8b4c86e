use super::point_capture::{CaptureFeedback, CaptureMode};
use crate::plot::renderer::{CurveHandle, Renderer};
use crate::plot::style::CurveStyle;

/// Draws the captured points as one marker curve on a [`Renderer`].
pub struct MarkerOverlay<'a, R: Renderer> {
    pub renderer: &'a mut R,
    pub handle: &'a mut Option<CurveHandle>,
    pub style: &'a CurveStyle,
}

impl<R: Renderer> CaptureFeedback for MarkerOverlay<'_, R> {
    fn points_changed(&mut self, mode: CaptureMode, points: &[[f64; 2]]) {
        match *self.handle {
            Some(handle) => self.renderer.set_position(handle, points),
            None => {
                let (x, y): (Vec<f64>, Vec<f64>) = points.iter().map(|&[x, y]| (x, y)).unzip();
                *self.handle = Some(self.renderer.draw(&mode.to_string(), &x, &y, self.style));
            }
        }
        self.renderer.redraw();
    }

    fn released(&mut self, _mode: CaptureMode) {
        if let Some(handle) = self.handle.take() {
            self.renderer.undraw(handle);
            self.renderer.redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::point_capture::{CaptureLock, PointCapture};
    use crate::plot::surface::PlotSurface;

    #[test]
    fn markers_follow_the_session() {
        let mut surface = PlotSurface::new();
        let mut handle = None;
        let style = CurveStyle::peak_marking();
        let mut capture = PointCapture::new(CaptureMode::Peak, CaptureLock::new());

        capture.start().unwrap();
        for (x, y) in [(1.0, 2.0), (3.0, 4.0)] {
            let mut overlay = MarkerOverlay {
                renderer: &mut surface,
                handle: &mut handle,
                style: &style,
            };
            capture.append(x, y, &mut overlay).unwrap();
        }

        let drawn = handle.unwrap();
        assert_eq!(surface.len(), 1);
        assert_eq!(surface.curve(drawn).unwrap().points, vec![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(surface.curve(drawn).unwrap().style, style);

        let mut overlay = MarkerOverlay {
            renderer: &mut surface,
            handle: &mut handle,
            style: &style,
        };
        capture.commit(&mut overlay).unwrap();
        assert!(handle.is_none());
        assert!(surface.is_empty());
    }
}
