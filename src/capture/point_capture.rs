use std::cell::Cell;
use std::rc::Rc;

use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum CaptureMode {
    /// Plain marking, the points are exported as they are.
    Range,
    /// Fit marking: first and last point bound the fit range, the others seed peaks.
    Peak,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range => write!(f, "marking"),
            Self::Peak => write!(f, "fit marking"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Inactive,
    Active,
}

/// Flag guarding the rule that only one capture session runs at a time.
///
/// Every capture holding a clone of the same lock competes for it; windows
/// of one process share [`CaptureLock::shared`].
#[derive(Debug, Clone, Default)]
pub struct CaptureLock(Rc<Cell<bool>>);

thread_local! {
    static SHARED_LOCK: CaptureLock = CaptureLock::default();
}

impl CaptureLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Self {
        SHARED_LOCK.with(Clone::clone)
    }

    pub fn is_held(&self) -> bool {
        self.0.get()
    }

    fn acquire(&self) -> bool {
        !self.0.replace(true)
    }

    fn release(&self) {
        self.0.set(false);
    }
}

/// Visual feedback for a capture session, owned by the caller.
pub trait CaptureFeedback {
    fn points_changed(&mut self, mode: CaptureMode, points: &[[f64; 2]]);

    /// The session ended; any markers it drew should go.
    fn released(&mut self, mode: CaptureMode);
}

pub struct NoFeedback;

impl CaptureFeedback for NoFeedback {
    fn points_changed(&mut self, _mode: CaptureMode, _points: &[[f64; 2]]) {}

    fn released(&mut self, _mode: CaptureMode) {}
}

/// Collects pointer positions between `start` and `commit`/`cancel`.
///
/// Failed transitions are logged and leave the session untouched.
#[derive(Debug)]
pub struct PointCapture {
    mode: CaptureMode,
    state: CaptureState,
    points: Vec<[f64; 2]>,
    lock: CaptureLock,
}

impl PointCapture {
    pub fn new(mode: CaptureMode, lock: CaptureLock) -> Self {
        Self {
            mode,
            state: CaptureState::Inactive,
            points: Vec::new(),
            lock,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CaptureState::Active
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    fn fail(&self, error: CaptureError) -> Result<(), CaptureError> {
        log::warn!("{}: {error}", self.mode);
        Err(error)
    }

    fn finish(&mut self, feedback: &mut dyn CaptureFeedback) {
        self.state = CaptureState::Inactive;
        self.lock.release();
        feedback.released(self.mode);
    }

    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_active() || !self.lock.acquire() {
            return self.fail(CaptureError::AlreadyActive);
        }
        self.points.clear();
        self.state = CaptureState::Active;
        log::info!("Started {}", self.mode);
        Ok(())
    }

    pub fn append(
        &mut self,
        x: f64,
        y: f64,
        feedback: &mut dyn CaptureFeedback,
    ) -> Result<(), CaptureError> {
        if !self.is_active() {
            return self.fail(CaptureError::Inactive);
        }
        self.points.push([x, y]);
        feedback.points_changed(self.mode, &self.points);
        Ok(())
    }

    /// Drops the last point. Removing the only point ends the session.
    pub fn undo(&mut self, feedback: &mut dyn CaptureFeedback) -> Result<(), CaptureError> {
        if !self.is_active() {
            return self.fail(CaptureError::Inactive);
        }
        if self.points.pop().is_none() {
            return self.fail(CaptureError::NothingToUndo);
        }

        if self.points.is_empty() {
            log::info!("Last point removed, {} cancelled", self.mode);
            self.finish(feedback);
        } else {
            feedback.points_changed(self.mode, &self.points);
        }
        Ok(())
    }

    /// Ends the session keeping the points for [`Self::get_data`].
    pub fn commit(&mut self, feedback: &mut dyn CaptureFeedback) -> Result<(), CaptureError> {
        if !self.is_active() {
            return self.fail(CaptureError::Inactive);
        }
        log::info!("Finished {} with {} points", self.mode, self.points.len());
        self.finish(feedback);
        Ok(())
    }

    pub fn cancel(&mut self, feedback: &mut dyn CaptureFeedback) -> Result<(), CaptureError> {
        if !self.is_active() {
            return self.fail(CaptureError::Inactive);
        }
        self.points.clear();
        log::info!("Cancelled {}", self.mode);
        self.finish(feedback);
        Ok(())
    }

    /// Captured x and y values in arrival order.
    pub fn get_data(&self) -> (Vec<f64>, Vec<f64>) {
        self.points.iter().map(|&[x, y]| (x, y)).unzip()
    }

    /// `E [keV], N` table of the captured points.
    pub fn to_csv(&self) -> Result<String, CaptureError> {
        if self.points.is_empty() {
            return Err(CaptureError::NoPoints);
        }
        let mut csv = String::from("E [keV], N\n");
        for [x, y] in &self.points {
            csv.push_str(&format!("{x:.2}, {y:.2}\n"));
        }
        Ok(csv)
    }
}

impl Drop for PointCapture {
    fn drop(&mut self) {
        if self.is_active() {
            self.lock.release();
        }
    }
}
