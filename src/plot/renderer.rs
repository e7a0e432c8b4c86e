use super::style::CurveStyle;

/// Opaque identity of one drawn curve, handed out by a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize)]
pub struct CurveHandle(pub u64);

impl std::fmt::Display for CurveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Drawing surface the viewer talks to. It never deals with pixels, axes
/// limits or layout, only with curves identified by their handles.
pub trait Renderer {
    fn draw(&mut self, name: &str, x: &[f64], y: &[f64], style: &CurveStyle) -> CurveHandle;

    /// Removes the curve. Unknown handles are ignored.
    fn undraw(&mut self, handle: CurveHandle);

    fn set_line_width(&mut self, handle: CurveHandle, width: f32);

    /// Replaces the points of a drawn curve.
    fn set_position(&mut self, handle: CurveHandle, coords: &[[f64; 2]]);

    /// Requests a repaint once the current event is handled.
    fn redraw(&mut self);
}
