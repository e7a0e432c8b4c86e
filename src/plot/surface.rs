use egui_plot::{Line, PlotPoint, PlotPoints, PlotUi, Points};
use indexmap::IndexMap;

use super::renderer::{CurveHandle, Renderer};
use super::style::{CurveStyle, DrawStyle};

#[derive(Debug, Clone, PartialEq)]
pub struct PlotCurve {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: CurveStyle,
}

impl PlotCurve {
    /// Points as they are drawn, with `StepsMid` expanded into horizontal steps.
    pub fn drawn_points(&self) -> Vec<[f64; 2]> {
        match self.style.draw_style {
            DrawStyle::Default => self.points.clone(),
            DrawStyle::StepsMid => steps_mid(&self.points),
        }
    }

    fn draw(&self, handle: CurveHandle, plot_ui: &mut PlotUi<'_>) {
        let legend = if self.style.name_in_legend {
            self.name.as_str()
        } else {
            ""
        };

        if let Some(line_style) = self.style.line_style() {
            let plot_points: Vec<PlotPoint> = self
                .drawn_points()
                .into_iter()
                .map(|[x, y]| PlotPoint::new(x, y))
                .collect();

            let line = Line::new(legend, PlotPoints::Owned(plot_points))
                .width(self.style.width)
                .color(self.style.color)
                .style(line_style)
                .id(PlotSurface::item_id(handle));

            plot_ui.line(line);
        }

        if let Some(marker) = self.style.marker {
            let points = Points::new(legend, self.points.clone())
                .shape(marker.shape())
                .radius(self.style.marker_radius)
                .color(self.style.color);

            plot_ui.points(points);
        }
    }
}

fn steps_mid(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let n = points.len();
    let mut steps = Vec::with_capacity(2 * n);

    for (i, &[x, y]) in points.iter().enumerate() {
        let left = match i {
            0 if n > 1 => x - (points[1][0] - x) / 2.0,
            0 => x,
            _ => (points[i - 1][0] + x) / 2.0,
        };
        let right = if i + 1 < n {
            (x + points[i + 1][0]) / 2.0
        } else if i > 0 {
            x + (x - points[i - 1][0]) / 2.0
        } else {
            x
        };
        steps.push([left, y]);
        steps.push([right, y]);
    }

    steps
}

/// In-memory [`Renderer`] drawn into an `egui_plot` plot every frame.
#[derive(Debug, Default)]
pub struct PlotSurface {
    curves: IndexMap<CurveHandle, PlotCurve>,
    next_handle: u64,
    repaint: bool,
}

impl PlotSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn curve(&self, handle: CurveHandle) -> Option<&PlotCurve> {
        self.curves.get(&handle)
    }

    pub fn curves(&self) -> impl Iterator<Item = (CurveHandle, &PlotCurve)> {
        self.curves.iter().map(|(&handle, curve)| (handle, curve))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Returns whether a repaint was requested since the last call and clears the request.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.repaint)
    }

    pub fn item_id(handle: CurveHandle) -> egui::Id {
        egui::Id::new(("spectview_curve", handle.0))
    }

    /// Maps a hovered plot item back to the curve it was drawn for.
    pub fn handle_for_item(&self, id: egui::Id) -> Option<CurveHandle> {
        self.curves
            .keys()
            .copied()
            .find(|&handle| Self::item_id(handle) == id)
    }

    pub fn show(&self, plot_ui: &mut PlotUi<'_>) {
        for (&handle, curve) in &self.curves {
            curve.draw(handle, plot_ui);
        }
    }
}

impl Renderer for PlotSurface {
    fn draw(&mut self, name: &str, x: &[f64], y: &[f64], style: &CurveStyle) -> CurveHandle {
        let handle = CurveHandle(self.next_handle);
        self.next_handle += 1;

        let curve = PlotCurve {
            name: name.to_owned(),
            points: x.iter().zip(y.iter()).map(|(&x, &y)| [x, y]).collect(),
            style: style.clone(),
        };
        self.curves.insert(handle, curve);
        self.repaint = true;
        handle
    }

    fn undraw(&mut self, handle: CurveHandle) {
        if self.curves.shift_remove(&handle).is_none() {
            log::debug!("Curve {handle} is not drawn");
        }
        self.repaint = true;
    }

    fn set_line_width(&mut self, handle: CurveHandle, width: f32) {
        if let Some(curve) = self.curves.get_mut(&handle) {
            curve.style.width = width;
            self.repaint = true;
        }
    }

    fn set_position(&mut self, handle: CurveHandle, coords: &[[f64; 2]]) {
        if let Some(curve) = self.curves.get_mut(&handle) {
            curve.points = coords.to_vec();
            self.repaint = true;
        }
    }

    fn redraw(&mut self) {
        self.repaint = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_removal_keeps_order() {
        let mut surface = PlotSurface::new();
        let a = surface.draw("a", &[0.0], &[1.0], &CurveStyle::default());
        let b = surface.draw("b", &[0.0], &[2.0], &CurveStyle::default());
        let c = surface.draw("c", &[0.0], &[3.0], &CurveStyle::default());
        assert_ne!(a, b);

        surface.undraw(b);
        let names: Vec<&str> = surface.curves().map(|(_, c)| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);

        let d = surface.draw("d", &[], &[], &CurveStyle::default());
        assert_ne!(d, b);
        assert!(surface.curve(c).is_some());
        assert!(surface.curve(b).is_none());
    }

    #[test]
    fn width_and_position_updates() {
        let mut surface = PlotSurface::new();
        let h = surface.draw("m", &[], &[], &CurveStyle::marking());
        assert!(surface.take_repaint());
        assert!(!surface.take_repaint());

        surface.set_position(h, &[[1.0, 2.0], [3.0, 4.0]]);
        surface.set_line_width(h, 2.0);
        let curve = surface.curve(h).unwrap();
        assert_eq!(curve.points, vec![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(curve.style.width, 2.0);
        assert!(surface.take_repaint());
    }

    #[test]
    fn item_ids_map_back_to_handles() {
        let mut surface = PlotSurface::new();
        let _ = surface.draw("a", &[], &[], &CurveStyle::default());
        let b = surface.draw("b", &[], &[], &CurveStyle::default());
        assert_eq!(surface.handle_for_item(PlotSurface::item_id(b)), Some(b));
        assert_eq!(surface.handle_for_item(egui::Id::new("other")), None);
    }

    #[test]
    fn steps_are_centred_on_samples() {
        let steps = steps_mid(&[[0.0, 1.0], [1.0, 3.0], [2.0, 2.0]]);
        assert_eq!(
            steps,
            vec![
                [-0.5, 1.0],
                [0.5, 1.0],
                [0.5, 3.0],
                [1.5, 3.0],
                [1.5, 2.0],
                [2.5, 2.0]
            ]
        );
        assert_eq!(steps_mid(&[[4.0, 1.0]]), vec![[4.0, 1.0], [4.0, 1.0]]);
    }
}
