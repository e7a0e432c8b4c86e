use crate::plot::renderer::CurveHandle;
use std::error::Error;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    AlreadyActive,
    Inactive,
    NothingToUndo,
    NoPoints,
    NotEnoughPoints { needed: usize, found: usize },
}

impl Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "Another marking session is already active"),
            Self::Inactive => write!(f, "Marking mode is off"),
            Self::NothingToUndo => write!(f, "There are no marked points to undo"),
            Self::NoPoints => write!(f, "There aren't any marked points"),
            Self::NotEnoughPoints { needed, found } => write!(
                f,
                "At least {needed} marked points are needed, found {found}"
            ),
        }
    }
}

impl Error for CaptureError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName(String),
    NotFound(String),
    UnknownHandle(CurveHandle),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "The {name} curve has been already plotted"),
            Self::NotFound(name) => write!(f, "No curve named {name}"),
            Self::UnknownHandle(handle) => write!(f, "No curve is drawn with handle {handle}"),
        }
    }
}

impl Error for RegistryError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    DegenerateInput(String),
    Convergence(String),
    InvalidObservation(String),
    DuplicateParameter(String),
    MissingParameter(String),
}

impl Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateInput(x) => write!(f, "Fit input is degenerate: {x}"),
            Self::Convergence(x) => write!(f, "Fit did not converge: {x}"),
            Self::InvalidObservation(x) => write!(f, "Observation is invalid: {x}"),
            Self::DuplicateParameter(x) => write!(f, "Parameter {x} is already defined"),
            Self::MissingParameter(x) => write!(f, "Parameter {x} is missing"),
        }
    }
}

impl Error for FitError {}

#[derive(Debug)]
pub enum DataError {
    File(std::io::Error),
    Parse { line: usize, content: String },
    Empty(String),
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        Self::File(err)
    }
}

impl Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(x) => write!(f, "Spectrum file I/O error: {x}"),
            Self::Parse { line, content } => {
                write!(f, "Could not parse line {line} of spectrum file: {content:?}")
            }
            Self::Empty(path) => write!(f, "Spectrum file {path} contains no counts"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::File(x) => Some(x),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    File(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::File(err)
    }
}

impl From<serde_yaml::Error> for SettingsError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(x) => write!(f, "Could not read settings file: {x}"),
            Self::Yaml(x) => write!(f, "Could not parse settings: {x}"),
        }
    }
}

impl Error for SettingsError {}

#[derive(Debug)]
pub enum ViewerError {
    Capture(CaptureError),
    Registry(RegistryError),
    Fit(FitError),
    Data(DataError),
    Io(std::io::Error),
    NoSelection,
    NoFit,
}

impl From<CaptureError> for ViewerError {
    fn from(err: CaptureError) -> Self {
        Self::Capture(err)
    }
}

impl From<RegistryError> for ViewerError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

impl From<FitError> for ViewerError {
    fn from(err: FitError) -> Self {
        Self::Fit(err)
    }
}

impl From<DataError> for ViewerError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capture(x) => write!(f, "{x}"),
            Self::Registry(x) => write!(f, "{x}"),
            Self::Fit(x) => write!(f, "{x}"),
            Self::Data(x) => write!(f, "{x}"),
            Self::Io(x) => write!(f, "Output file I/O error: {x}"),
            Self::NoSelection => write!(f, "No spectrum is selected"),
            Self::NoFit => write!(f, "There is no fit to report"),
        }
    }
}

impl Error for ViewerError {}
