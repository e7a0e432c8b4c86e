use fnv::FnvHashMap;

use crate::plot::renderer::CurveHandle;

/// Commands a key binding can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum Action {
    ActivateMarking,
    ActivateMarkingForFit,
    DoFit,
    ReportFit,
    PrintMarkedPoints,
    RemovePlot,
}

/// Key name (lower case, as reported by egui) to action.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct KeyMap(FnvHashMap<String, Action>);

impl Default for KeyMap {
    fn default() -> Self {
        let mut map = Self(FnvHashMap::default());
        map.bind("f", Action::ActivateMarkingForFit);
        map.bind("g", Action::DoFit);
        map.bind("h", Action::ReportFit);
        map.bind("m", Action::ActivateMarking);
        map.bind("v", Action::ActivateMarking);
        map.bind("b", Action::PrintMarkedPoints);
        map.bind("r", Action::RemovePlot);
        map
    }
}

impl KeyMap {
    pub fn empty() -> Self {
        Self(FnvHashMap::default())
    }

    pub fn bind(&mut self, key: &str, action: Action) -> Option<Action> {
        self.0.insert(key.to_lowercase(), action)
    }

    pub fn unbind(&mut self, key: &str) -> Option<Action> {
        self.0.remove(&key.to_lowercase())
    }

    pub fn action(&self, key: &str) -> Option<Action> {
        self.0
            .get(&key.to_lowercase())
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(bound, _)| bound.eq_ignore_ascii_case(key))
                    .map(|(_, action)| action)
            })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    pub fn from_egui(button: egui::PointerButton) -> Option<Self> {
        match button {
            egui::PointerButton::Primary => Some(Self::Primary),
            egui::PointerButton::Middle => Some(Self::Middle),
            egui::PointerButton::Secondary => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Click in plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub button: PointerButton,
    pub x: f64,
    pub y: f64,
    pub double_click: bool,
    pub in_plot: bool,
}

impl PointerEvent {
    pub fn click(button: PointerButton, x: f64, y: f64) -> Self {
        Self {
            button,
            x,
            y,
            double_click: false,
            in_plot: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Key(String),
    Pointer(PointerEvent),
    /// A drawn curve was clicked.
    Pick(CurveHandle),
    /// Button press or any other direct request.
    Action(Action),
}

impl ViewerEvent {
    pub fn key(key: egui::Key) -> Self {
        Self::Key(key.name().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let keymap = KeyMap::default();
        assert_eq!(keymap.action("f"), Some(Action::ActivateMarkingForFit));
        assert_eq!(keymap.action("G"), Some(Action::DoFit));
        assert_eq!(keymap.action("v"), keymap.action("m"));
        assert_eq!(keymap.action("escape"), None);
    }

    #[test]
    fn keymap_from_yaml_replaces_defaults() {
        let keymap: KeyMap = serde_yaml::from_str("x: DoFit\nF: ReportFit\n").unwrap();
        assert_eq!(keymap.len(), 2);
        assert_eq!(keymap.action("x"), Some(Action::DoFit));
        assert_eq!(keymap.action("f"), Some(Action::ReportFit));
        assert_eq!(keymap.action("g"), None);
    }

    #[test]
    fn egui_key_names_are_lower_case() {
        assert_eq!(ViewerEvent::key(egui::Key::F), ViewerEvent::Key("f".to_owned()));
        assert_eq!(
            ViewerEvent::key(egui::Key::Escape),
            ViewerEvent::Key("escape".to_owned())
        );
    }
}
