use std::io::Write as _;
use std::path::{Path, PathBuf};

use fnv::FnvHashMap;

use crate::capture::fit_seed::FitSeed;
use crate::capture::overlay::MarkerOverlay;
use crate::capture::point_capture::{CaptureLock, CaptureMode, PointCapture};
use crate::data::spectrum::Spectrum;
use crate::error::{CaptureError, RegistryError, ViewerError};
use crate::fitter::common::Observation;
use crate::fitter::fit_engine::{FitEngine, FitResult};
use crate::plot::renderer::{CurveHandle, Renderer};
use crate::plot::surface::PlotSurface;
use crate::registry::curve_registry::{CurveRegistry, RegistryId};
use crate::registry::selection::{Selection, SelectionTracker};
use crate::settings::Settings;

use super::events::{Action, PointerButton, PointerEvent, ViewerEvent};

/// One spectrum window: the spectra and fit curves drawn on a renderer, the
/// selected curve, both marking sessions and the fit engine.
pub struct Viewer<R: Renderer> {
    renderer: R,
    pub settings: Settings,
    spectra: CurveRegistry,
    fits: CurveRegistry,
    /// Fit curve name to the name of the curve it was fitted on.
    fit_sources: FnvHashMap<String, String>,
    selection: SelectionTracker,
    marking: PointCapture,
    fit_marking: PointCapture,
    marking_handle: Option<CurveHandle>,
    fit_marking_handle: Option<CurveHandle>,
    lock: CaptureLock,
    engine: FitEngine,
    /// Last fit and the curve it was made on.
    last_fit: Option<(FitResult, String)>,
}

impl<R: Renderer> Viewer<R> {
    /// Viewer sharing the process-wide capture lock.
    pub fn new(renderer: R, settings: Settings) -> Self {
        Self::with_lock(renderer, settings, CaptureLock::shared())
    }

    pub fn with_lock(renderer: R, settings: Settings, lock: CaptureLock) -> Self {
        Self {
            renderer,
            selection: SelectionTracker::new(
                settings.normal_line_width,
                settings.highlight_line_width,
            ),
            engine: FitEngine::new(settings.solver),
            settings,
            spectra: CurveRegistry::new(RegistryId::Spectra),
            fits: CurveRegistry::new(RegistryId::Fits),
            fit_sources: FnvHashMap::default(),
            marking: PointCapture::new(CaptureMode::Range, lock.clone()),
            fit_marking: PointCapture::new(CaptureMode::Peak, lock.clone()),
            marking_handle: None,
            fit_marking_handle: None,
            lock,
            last_fit: None,
        }
    }

    /// Another window with the same settings, competing for the same capture lock.
    pub fn new_window<S: Renderer>(&self, renderer: S) -> Viewer<S> {
        log::info!("Opening a new window");
        Viewer::with_lock(renderer, self.settings.clone(), self.lock.clone())
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn spectra(&self) -> &CurveRegistry {
        &self.spectra
    }

    pub fn fits(&self) -> &CurveRegistry {
        &self.fits
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn marking(&self) -> &PointCapture {
        &self.marking
    }

    pub fn fit_marking(&self) -> &PointCapture {
        &self.fit_marking
    }

    pub fn engine(&self) -> &FitEngine {
        &self.engine
    }

    pub fn last_fit(&self) -> Option<&FitResult> {
        self.last_fit.as_ref().map(|(result, _)| result)
    }

    /// Name of the selected curve.
    pub fn gate_name(&self) -> Option<&str> {
        self.selection.current().map(|s| s.name.as_str())
    }

    fn registry(&self, id: RegistryId) -> &CurveRegistry {
        match id {
            RegistryId::Spectra => &self.spectra,
            RegistryId::Fits => &self.fits,
        }
    }

    fn capture_parts(&mut self, mode: CaptureMode) -> (&mut PointCapture, MarkerOverlay<'_, R>) {
        let (capture, handle, style) = match mode {
            CaptureMode::Range => (
                &mut self.marking,
                &mut self.marking_handle,
                &self.settings.marking_style,
            ),
            CaptureMode::Peak => (
                &mut self.fit_marking,
                &mut self.fit_marking_handle,
                &self.settings.peak_marking_style,
            ),
        };
        let overlay = MarkerOverlay {
            renderer: &mut self.renderer,
            handle,
            style,
        };
        (capture, overlay)
    }

    pub fn active_capture(&self) -> Option<CaptureMode> {
        [&self.marking, &self.fit_marking]
            .into_iter()
            .find(|capture| capture.is_active())
            .map(|capture| capture.mode())
    }

    pub fn add_spectrum(&mut self, spectrum: &Spectrum) -> Result<CurveHandle, ViewerError> {
        let (x, y) = spectrum.get_spectrum(None);
        let name = spectrum.name().to_owned();
        let handle = self.spectra.add(
            &mut self.renderer,
            &name,
            x,
            y,
            self.settings.spectrum_style.clone(),
        )?;

        log::info!("Added {name} ({})", spectrum.gate);
        self.selection.select_quiet(
            &mut self.renderer,
            Some(Selection {
                registry: RegistryId::Spectra,
                name,
                handle,
            }),
        );
        self.renderer.redraw();
        Ok(handle)
    }

    pub fn add_spectrum_from_file(&mut self, path: impl AsRef<Path>) -> Result<CurveHandle, ViewerError> {
        let spectrum = Spectrum::from_txt(path)?;
        self.add_spectrum(&spectrum)
    }

    /// Selects the clicked curve. Ignored while marking.
    pub fn pick(&mut self, handle: CurveHandle) -> Result<(), ViewerError> {
        if let Some(mode) = self.active_capture() {
            log::debug!("Ignoring pick of {handle} during {mode}");
            return Ok(());
        }

        let selection = [RegistryId::Spectra, RegistryId::Fits]
            .into_iter()
            .find_map(|id| {
                self.registry(id)
                    .find_name_by_handle(handle)
                    .map(|name| Selection {
                        registry: id,
                        name: name.to_owned(),
                        handle,
                    })
            })
            .ok_or(RegistryError::UnknownHandle(handle))?;

        self.selection.select(&mut self.renderer, Some(selection));
        Ok(())
    }

    fn auto_select_next(&mut self) {
        let next = self.spectra.first().map(|curve| Selection {
            registry: RegistryId::Spectra,
            name: curve.name.clone(),
            handle: curve.handle,
        });
        self.selection.select_quiet(&mut self.renderer, next);
    }

    /// Fit curves made on `name`, and on those fits in turn.
    fn fits_derived_from(&self, name: &str) -> Vec<String> {
        let mut derived = Vec::new();
        let mut sources = vec![name.to_owned()];
        while let Some(source) = sources.pop() {
            for (fit, _) in self.fit_sources.iter().filter(|(_, s)| **s == source) {
                derived.push(fit.clone());
                sources.push(fit.clone());
            }
        }
        derived
    }

    /// Removes the selected curve together with every fit made on it.
    pub fn remove_selected(&mut self) -> Result<(), ViewerError> {
        let selected = self
            .selection
            .current()
            .cloned()
            .ok_or(ViewerError::NoSelection)?;

        match selected.registry {
            RegistryId::Spectra => self.spectra.remove(&mut self.renderer, &selected.name)?,
            RegistryId::Fits => self.fits.remove(&mut self.renderer, &selected.name)?,
        };
        self.fit_sources.remove(&selected.name);

        for name in self.fits_derived_from(&selected.name) {
            self.fits.remove(&mut self.renderer, &name)?;
            self.fit_sources.remove(&name);
        }

        log::info!("Removed {}", selected.name);
        self.selection.forget(selected.registry, &selected.name);
        self.auto_select_next();
        self.renderer.redraw();
        Ok(())
    }

    pub fn activate_marking(&mut self) -> Result<(), ViewerError> {
        Ok(self.marking.start()?)
    }

    pub fn activate_marking_for_fit(&mut self) -> Result<(), ViewerError> {
        Ok(self.fit_marking.start()?)
    }

    fn append_point(&mut self, x: f64, y: f64) -> Result<(), CaptureError> {
        let mode = self.active_capture().ok_or(CaptureError::Inactive)?;
        let (capture, mut overlay) = self.capture_parts(mode);
        capture.append(x, y, &mut overlay)?;
        log::info!("{x:8.2} {y:8.2}");
        Ok(())
    }

    pub fn undo_point(&mut self) -> Result<(), CaptureError> {
        let mode = self.active_capture().ok_or(CaptureError::Inactive)?;
        let (capture, mut overlay) = self.capture_parts(mode);
        capture.undo(&mut overlay)
    }

    pub fn commit_capture(&mut self) -> Result<(), CaptureError> {
        let mode = self.active_capture().ok_or(CaptureError::Inactive)?;
        let (capture, mut overlay) = self.capture_parts(mode);
        capture.commit(&mut overlay)
    }

    pub fn cancel_capture(&mut self) -> Result<(), CaptureError> {
        let mode = self.active_capture().ok_or(CaptureError::Inactive)?;
        let (capture, mut overlay) = self.capture_parts(mode);
        capture.cancel(&mut overlay)
    }

    /// Fits the selected curve with the range and peaks of the fit marking,
    /// finishing the marking first if it is still running.
    ///
    /// A fit that ran but failed is returned as `Ok` with `succeeded == false`;
    /// only a successful fit is drawn.
    pub fn do_fit(&mut self) -> Result<FitResult, ViewerError> {
        if self.fit_marking.is_active() {
            let (capture, mut overlay) = self.capture_parts(CaptureMode::Peak);
            capture.commit(&mut overlay)?;
        }

        let seed = FitSeed::from_points(self.fit_marking.points())?;
        let selected = self
            .selection
            .current()
            .cloned()
            .ok_or(ViewerError::NoSelection)?;
        let curve = self
            .registry(selected.registry)
            .get(&selected.name)
            .ok_or_else(|| RegistryError::NotFound(selected.name.clone()))?;

        let (lo, hi) = seed.bounds();
        let observation = Observation::new(curve.x.clone(), curve.y.clone())?.slice_range(lo, hi);

        let params = match self.settings.width_bounds() {
            Some((min, max)) => FitEngine::initialize_with_width_bounds(
                &seed.peaks,
                self.settings.default_width,
                min,
                max,
            ),
            None => FitEngine::initialize(&seed.peaks, self.settings.default_width),
        };

        let result = self.engine.fit(params, &observation);
        self.last_fit = Some((result.clone(), selected.name.clone()));

        if result.succeeded {
            let (x, y) = FitEngine::resample(&result.params, &observation, self.settings.fit_step)?;
            let name = format!("fit_{}_{}", result.fit_index, selected.name);
            self.fits.add(
                &mut self.renderer,
                &name,
                x,
                y,
                self.settings.fit_style.clone(),
            )?;
            log::info!("Stored {name}");
            self.fit_sources.insert(name, selected.name);
            self.renderer.redraw();
        }

        Ok(result)
    }

    fn append_to(dir: &Path, file_name: &str, text: &str) -> Result<PathBuf, ViewerError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        file.write_all(text.as_bytes())?;
        Ok(path)
    }

    /// Appends the report of the last fit to `fit_results_<name>.txt`.
    pub fn report_fit(&self) -> Result<PathBuf, ViewerError> {
        let (result, name) = self.last_fit.as_ref().ok_or(ViewerError::NoFit)?;
        let file_name = format!("fit_results_{}.txt", name.replace(' ', ""));
        let path = Self::append_to(
            &self.settings.fit_results_dir,
            &file_name,
            &FitEngine::report(result),
        )?;
        log::info!("Fit report saved to the {} file", path.display());
        Ok(path)
    }

    /// Appends the points of the last plain marking to `peaks_<name>.csv`.
    pub fn print_marked_points(&self) -> Result<PathBuf, ViewerError> {
        let csv = self.marking.to_csv()?;
        let file_name = match self.gate_name() {
            Some(name) => format!("peaks_{}.csv", name.replace(' ', "")),
            None => "peaks.csv".to_owned(),
        };
        let path = Self::append_to(&self.settings.marked_points_dir, &file_name, &csv)?;
        log::info!("Marked points saved to the {} file", path.display());
        Ok(path)
    }

    pub fn run_action(&mut self, action: Action) -> Result<(), ViewerError> {
        match action {
            Action::ActivateMarking => self.activate_marking(),
            Action::ActivateMarkingForFit => self.activate_marking_for_fit(),
            Action::DoFit => self.do_fit().map(|_| ()),
            Action::ReportFit => self.report_fit().map(|_| ()),
            Action::PrintMarkedPoints => self.print_marked_points().map(|_| ()),
            Action::RemovePlot => self.remove_selected(),
        }
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> Result<(), ViewerError> {
        if self.active_capture().is_none() {
            return Ok(());
        }
        match event.button {
            PointerButton::Primary if !event.double_click && event.in_plot => {
                self.append_point(event.x, event.y)?;
            }
            PointerButton::Primary => {}
            PointerButton::Middle => self.commit_capture()?,
            PointerButton::Secondary => self.undo_point()?,
        }
        Ok(())
    }

    /// Single entry point for input. While marking, Enter commits and
    /// Escape cancels; every other key goes through the key map.
    pub fn handle_event(&mut self, event: ViewerEvent) -> Result<(), ViewerError> {
        match event {
            ViewerEvent::Key(key) => {
                if self.active_capture().is_some() {
                    match key.as_str() {
                        "enter" => return Ok(self.commit_capture()?),
                        "escape" => return Ok(self.cancel_capture()?),
                        _ => {}
                    }
                }
                match self.settings.keymap.action(&key) {
                    Some(action) => self.run_action(action),
                    None => Ok(()),
                }
            }
            ViewerEvent::Pointer(pointer) => self.handle_pointer(pointer),
            ViewerEvent::Pick(handle) => self.pick(handle),
            ViewerEvent::Action(action) => self.run_action(action),
        }
    }
}

impl Viewer<PlotSurface> {
    /// Draws the window into `ui` and feeds the frame's input to [`Self::handle_event`].
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        let mut events: Vec<ViewerEvent> = ui.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key, pressed: true, ..
                    } => Some(ViewerEvent::key(*key)),
                    _ => None,
                })
                .collect()
        });

        let plot = egui_plot::Plot::new("spectview").legend(egui_plot::Legend::default());
        let plot_response = plot.show(ui, |plot_ui| {
            self.renderer.show(plot_ui);
            plot_ui.pointer_coordinate()
        });

        let response = &plot_response.response;
        if let Some(coordinate) = plot_response.inner {
            for egui_button in [
                egui::PointerButton::Primary,
                egui::PointerButton::Middle,
                egui::PointerButton::Secondary,
            ] {
                if let Some(button) = PointerButton::from_egui(egui_button)
                    && response.clicked_by(egui_button)
                {
                    events.push(ViewerEvent::Pointer(PointerEvent {
                        button,
                        x: coordinate.x,
                        y: coordinate.y,
                        double_click: response.double_clicked_by(egui_button),
                        in_plot: true,
                    }));
                }
            }
        }

        if response.clicked()
            && let Some(id) = plot_response.hovered_plot_item
            && let Some(handle) = self.renderer.handle_for_item(id)
        {
            events.push(ViewerEvent::Pick(handle));
        }

        for event in events {
            match self.handle_event(event) {
                Ok(()) | Err(ViewerError::Capture(_)) => {}
                Err(e) => log::warn!("{e}"),
            }
        }

        if self.renderer.take_repaint() {
            ui.ctx().request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;
    use crate::plot::style::CurveStyle;

    fn gaussian_spectrum(name: &str) -> Spectrum {
        let counts = (0..100)
            .map(|i| {
                let x = f64::from(i);
                100.0 * (-((x - 50.0).powi(2)) / 18.0).exp() + 0.1 * x + 5.0
            })
            .collect();
        Spectrum::from_counts(name, counts)
    }

    fn viewer() -> Viewer<PlotSurface> {
        Viewer::with_lock(PlotSurface::new(), Settings::default(), CaptureLock::new())
    }

    fn click(viewer: &mut Viewer<PlotSurface>, x: f64, y: f64) {
        viewer
            .handle_event(ViewerEvent::Pointer(PointerEvent::click(
                PointerButton::Primary,
                x,
                y,
            )))
            .unwrap();
    }

    fn key(viewer: &mut Viewer<PlotSurface>, key: &str) -> Result<(), ViewerError> {
        viewer.handle_event(ViewerEvent::Key(key.to_owned()))
    }

    #[test]
    fn added_spectrum_is_selected_quietly() {
        let mut viewer = viewer();
        let handle = viewer.add_spectrum(&gaussian_spectrum("gate_g1")).unwrap();
        assert_eq!(viewer.gate_name(), Some("gate_g1"));
        assert!(!viewer.selection().is_highlighted());

        viewer.pick(handle).unwrap();
        assert!(viewer.selection().is_highlighted());
        assert_eq!(viewer.renderer().curve(handle).unwrap().style.width, 2.0);

        assert!(matches!(
            viewer.add_spectrum(&gaussian_spectrum("gate_g1")),
            Err(ViewerError::Registry(RegistryError::DuplicateName(_)))
        ));
    }

    #[test]
    fn fit_through_key_events() {
        let mut viewer = viewer();
        viewer.add_spectrum(&gaussian_spectrum("gate_g50")).unwrap();

        key(&mut viewer, "f").unwrap();
        assert_eq!(viewer.active_capture(), Some(CaptureMode::Peak));
        click(&mut viewer, 10.0, 6.0);
        click(&mut viewer, 50.0, 100.0);
        click(&mut viewer, 90.0, 14.0);
        assert_eq!(viewer.renderer().len(), 2);

        key(&mut viewer, "g").unwrap();
        assert_eq!(viewer.active_capture(), None);
        let fit = viewer.last_fit().unwrap();
        assert!(fit.succeeded, "{}", fit.message);
        assert!((fit.value("cen_0").unwrap() - 50.0).abs() < 0.5);
        assert!(viewer.fits().contains("fit_0_gate_g50"));
        assert_eq!(viewer.engine().ith_fit(), 1);

        let curve = viewer.fits().get("fit_0_gate_g50").unwrap();
        assert_eq!(curve.x.first(), Some(&10.0));
        assert_eq!(curve.style, CurveStyle::fit());
        // spectrum and fit, the markers are gone
        assert_eq!(viewer.renderer().len(), 2);
    }

    #[test]
    fn picks_are_ignored_while_marking() {
        let mut viewer = viewer();
        let a = viewer.add_spectrum(&gaussian_spectrum("a")).unwrap();
        let b = viewer.add_spectrum(&gaussian_spectrum("b")).unwrap();
        assert_eq!(viewer.gate_name(), Some("b"));

        viewer.activate_marking().unwrap();
        viewer.handle_event(ViewerEvent::Pick(a)).unwrap();
        assert_eq!(viewer.gate_name(), Some("b"));

        key(&mut viewer, "escape").unwrap();
        assert_eq!(viewer.active_capture(), None);
        viewer.handle_event(ViewerEvent::Pick(a)).unwrap();
        assert_eq!(viewer.gate_name(), Some("a"));
        assert_eq!(viewer.renderer().curve(b).unwrap().style.width, 1.0);
    }

    #[test]
    fn removing_a_spectrum_removes_its_fits() {
        let mut viewer = viewer();
        viewer.add_spectrum(&gaussian_spectrum("first")).unwrap();
        viewer.add_spectrum(&gaussian_spectrum("second")).unwrap();

        viewer.activate_marking_for_fit().unwrap();
        for (x, y) in [(20.0, 8.0), (50.0, 100.0), (80.0, 13.0)] {
            click(&mut viewer, x, y);
        }
        viewer.do_fit().unwrap();
        assert!(viewer.fits().contains("fit_0_second"));

        viewer.run_action(Action::RemovePlot).unwrap();
        assert!(viewer.fits().is_empty());
        assert!(!viewer.spectra().contains("second"));
        assert_eq!(viewer.gate_name(), Some("first"));
        assert_eq!(viewer.renderer().len(), 1);

        viewer.remove_selected().unwrap();
        assert_eq!(viewer.gate_name(), None);
        assert!(matches!(viewer.remove_selected(), Err(ViewerError::NoSelection)));
    }

    fn fit_selected(viewer: &mut Viewer<PlotSurface>) -> Result<FitResult, ViewerError> {
        viewer.activate_marking_for_fit().unwrap();
        for (x, y) in [(20.0, 8.0), (50.0, 100.0), (80.0, 13.0)] {
            click(viewer, x, y);
        }
        viewer.do_fit()
    }

    #[test]
    fn removal_keeps_fits_of_similarly_named_spectra() {
        let mut viewer = viewer();
        viewer.add_spectrum(&gaussian_spectrum("gg1")).unwrap();
        fit_selected(&mut viewer).unwrap();
        assert!(viewer.fits().contains("fit_0_gg1"));

        viewer.add_spectrum(&gaussian_spectrum("g1")).unwrap();
        fit_selected(&mut viewer).unwrap();
        assert_eq!(viewer.gate_name(), Some("g1"));

        viewer.remove_selected().unwrap();
        assert!(!viewer.fits().contains("fit_1_g1"));
        assert!(viewer.fits().contains("fit_0_gg1"));
        assert_eq!(viewer.gate_name(), Some("gg1"));
    }

    #[test]
    fn fit_is_kept_for_report_when_drawing_fails() {
        let mut viewer = viewer();
        viewer.settings.fit_step = 0.0;
        viewer.add_spectrum(&gaussian_spectrum("g")).unwrap();

        assert!(matches!(
            fit_selected(&mut viewer),
            Err(ViewerError::Fit(FitError::DegenerateInput(_)))
        ));
        assert_eq!(viewer.engine().ith_fit(), 1);
        assert!(viewer.fits().is_empty());
        let last = viewer.last_fit().unwrap();
        assert!(last.succeeded, "{}", last.message);
        assert_eq!(last.fit_index, 0);
    }

    #[test]
    fn windows_share_one_capture_session() {
        let mut first = viewer();
        let mut second = first.new_window(PlotSurface::new());

        first.activate_marking().unwrap();
        assert!(matches!(
            second.activate_marking_for_fit(),
            Err(ViewerError::Capture(CaptureError::AlreadyActive))
        ));

        first.handle_event(ViewerEvent::Pointer(PointerEvent::click(PointerButton::Middle, 0.0, 0.0)))
            .unwrap();
        second.activate_marking_for_fit().unwrap();
    }

    #[test]
    fn fit_needs_marked_range() {
        let mut viewer = viewer();
        viewer.add_spectrum(&gaussian_spectrum("g")).unwrap();
        assert!(matches!(
            viewer.do_fit(),
            Err(ViewerError::Capture(CaptureError::NoPoints))
        ));
        assert!(matches!(viewer.report_fit(), Err(ViewerError::NoFit)));
    }
}
