use super::curve_registry::RegistryId;
use crate::plot::renderer::{CurveHandle, Renderer};

/// Reference to a registered curve. It never owns the curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub registry: RegistryId,
    pub name: String,
    pub handle: CurveHandle,
}

/// Tracks the selected curve and whether it is drawn highlighted.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    current: Option<Selection>,
    highlighted: bool,
    pub normal_width: f32,
    pub highlight_width: f32,
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(1.0, 2.0)
    }
}

impl SelectionTracker {
    pub fn new(normal_width: f32, highlight_width: f32) -> Self {
        Self {
            current: None,
            highlighted: false,
            normal_width,
            highlight_width,
        }
    }

    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    fn unhighlight<R: Renderer>(&mut self, renderer: &mut R) {
        if let Some(current) = &self.current
            && self.highlighted
        {
            renderer.set_line_width(current.handle, self.normal_width);
        }
        self.highlighted = false;
    }

    /// Handles a pick: the same curve toggles its highlight, another curve
    /// takes over the selection highlighted, `None` clears everything.
    pub fn select<R: Renderer>(&mut self, renderer: &mut R, selection: Option<Selection>) {
        match selection {
            Some(selection) if self.current.as_ref().map(|c| c.handle) == Some(selection.handle) => {
                self.highlighted = !self.highlighted;
                let width = if self.highlighted {
                    self.highlight_width
                } else {
                    self.normal_width
                };
                renderer.set_line_width(selection.handle, width);
                self.current = Some(selection);
            }
            Some(selection) => {
                self.unhighlight(renderer);
                renderer.set_line_width(selection.handle, self.highlight_width);
                log::info!("Selected {} from {}", selection.name, selection.registry);
                self.current = Some(selection);
                self.highlighted = true;
            }
            None => {
                self.unhighlight(renderer);
                self.current = None;
            }
        }
        renderer.redraw();
    }

    /// Selects without highlighting, as done for freshly added curves.
    pub fn select_quiet<R: Renderer>(&mut self, renderer: &mut R, selection: Option<Selection>) {
        self.unhighlight(renderer);
        self.current = selection;
    }

    /// Drops the selection if it refers to the given curve.
    pub fn forget(&mut self, registry: RegistryId, name: &str) {
        if self
            .current
            .as_ref()
            .is_some_and(|c| c.registry == registry && c.name == name)
        {
            self.current = None;
            self.highlighted = false;
        }
    }
}
