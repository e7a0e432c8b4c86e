use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::fitter::solver::SolverSettings;
use crate::plot::style::CurveStyle;
use crate::viewer::events::KeyMap;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Settings {
    /// Initial width of every peak, in channels.
    pub default_width: f64,
    /// Sampling step of the drawn fit curve.
    pub fit_step: f64,
    pub constrain_width: bool,
    pub width_min: f64,
    pub width_max: f64,
    pub solver: SolverSettings,

    pub spectrum_style: CurveStyle,
    pub fit_style: CurveStyle,
    pub marking_style: CurveStyle,
    pub peak_marking_style: CurveStyle,
    pub normal_line_width: f32,
    pub highlight_line_width: f32,

    pub fit_results_dir: PathBuf,
    pub marked_points_dir: PathBuf,

    pub keymap: KeyMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_width: 1.0,
            fit_step: 0.1,
            constrain_width: false,
            width_min: 0.1,
            width_max: 10.0,
            solver: SolverSettings::default(),
            spectrum_style: CurveStyle::spectrum(),
            fit_style: CurveStyle::fit(),
            marking_style: CurveStyle::marking(),
            peak_marking_style: CurveStyle::peak_marking(),
            normal_line_width: 1.0,
            highlight_line_width: 2.0,
            fit_results_dir: PathBuf::from("./fits/"),
            marked_points_dir: PathBuf::from("./peaks/"),
            keymap: KeyMap::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_yaml_str(&yaml)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_yaml(&self) -> Result<String, SettingsError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Width bounds applied to every peak, if enabled.
    pub fn width_bounds(&self) -> Option<(f64, f64)> {
        self.constrain_width
            .then_some((self.width_min, self.width_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::events::Action;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = Settings::from_yaml_str(
            "default_width: 2.5\nconstrain_width: true\nsolver:\n  ftol: 1.0e-8\n",
        )
        .unwrap();
        assert_eq!(settings.default_width, 2.5);
        assert_eq!(settings.width_bounds(), Some((0.1, 10.0)));
        assert_eq!(settings.solver.ftol, 1e-8);
        assert_eq!(settings.solver.xtol, SolverSettings::default().xtol);
        assert_eq!(settings.fit_step, 0.1);
        assert_eq!(settings.keymap.action("g"), Some(Action::DoFit));
    }

    #[test]
    fn yaml_round_trip_preserves_settings() {
        let settings = Settings {
            fit_results_dir: PathBuf::from("/tmp/fits"),
            ..Default::default()
        };
        let parsed = Settings::from_yaml_str(&settings.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn file_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Settings::from_yaml_file(dir.path().join("none.yaml")),
            Err(SettingsError::File(_))
        ));

        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "default_width: [1, 2]\n").unwrap();
        assert!(matches!(
            Settings::from_yaml_file(&path),
            Err(SettingsError::Yaml(_))
        ));
    }
}
