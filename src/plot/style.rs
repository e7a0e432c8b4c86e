use egui::Color32;
use egui_plot::{LineStyle, MarkerShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
pub enum LineKind {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// Markers only.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
pub enum DrawStyle {
    #[default]
    Default,
    /// Histogram steps centred on each sample.
    StepsMid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum MarkerKind {
    Plus,
    Cross,
    Circle,
    Diamond,
}

impl MarkerKind {
    pub fn shape(self) -> MarkerShape {
        match self {
            Self::Plus => MarkerShape::Plus,
            Self::Cross => MarkerShape::Cross,
            Self::Circle => MarkerShape::Circle,
            Self::Diamond => MarkerShape::Diamond,
        }
    }
}

/// Display attributes of one drawn curve.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CurveStyle {
    pub color: Color32,
    pub width: f32,
    pub line: LineKind,
    pub style_length: f32,
    pub draw_style: DrawStyle,
    pub marker: Option<MarkerKind>,
    pub marker_radius: f32,
    pub name_in_legend: bool,
}

impl Default for CurveStyle {
    fn default() -> Self {
        Self {
            color: Color32::LIGHT_BLUE,
            width: 1.0,
            line: LineKind::Solid,
            style_length: 15.0,
            draw_style: DrawStyle::Default,
            marker: None,
            marker_radius: 3.0,
            name_in_legend: true,
        }
    }
}

impl CurveStyle {
    pub fn new(color: Color32) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn spectrum() -> Self {
        Self {
            draw_style: DrawStyle::StepsMid,
            ..Default::default()
        }
    }

    pub fn fit() -> Self {
        Self {
            color: Color32::RED,
            width: 2.0,
            line: LineKind::Dashed,
            ..Default::default()
        }
    }

    /// Black `+` markers for plain point marking.
    pub fn marking() -> Self {
        Self {
            color: Color32::BLACK,
            line: LineKind::Hidden,
            marker: Some(MarkerKind::Plus),
            marker_radius: 5.0,
            name_in_legend: false,
            ..Default::default()
        }
    }

    /// Red `+` markers for fit range and peak seeds.
    pub fn peak_marking() -> Self {
        Self {
            color: Color32::RED,
            ..Self::marking()
        }
    }

    pub fn with_width(self, width: f32) -> Self {
        Self { width, ..self }
    }

    pub fn line_style(&self) -> Option<LineStyle> {
        match self.line {
            LineKind::Solid => Some(LineStyle::Solid),
            LineKind::Dashed => Some(LineStyle::Dashed {
                length: self.style_length,
            }),
            LineKind::Dotted => Some(LineStyle::Dotted {
                spacing: self.style_length,
            }),
            LineKind::Hidden => None,
        }
    }
}
