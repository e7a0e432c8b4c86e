use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum GateKind {
    Gate,
    Background,
    Unknown,
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gate => write!(f, "gate"),
            Self::Background => write!(f, "bg"),
            Self::Unknown => write!(f, "spectrum"),
        }
    }
}

/// What a spectrum file was gated on, read from its file name
/// (e.g. `gate_g1436_g539.txt`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct GateInfo {
    /// File name up to the first dot, used as the curve name.
    pub name: String,
    pub kind: GateKind,
    pub gammas: Vec<u32>,
}

static GAMMA_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"g(\d+)").expect("gamma token pattern is valid"));

impl GateInfo {
    /// Parses `name` as given, without cutting it at a dot.
    pub fn from_name(name: &str) -> Self {
        let kind = if name.contains("gate") {
            GateKind::Gate
        } else if name.contains("bg") {
            GateKind::Background
        } else {
            GateKind::Unknown
        };

        let gammas = GAMMA_TOKEN
            .captures_iter(name)
            .filter_map(|caps| caps[1].parse().ok())
            .collect();

        Self {
            name: name.to_owned(),
            kind,
            gammas,
        }
    }

    /// Parses the file name of `path`; the curve name stops at the first dot.
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut info = Self::from_name(&file_name);
        if let Some((stem, _)) = file_name.split_once('.') {
            info.name = stem.to_owned();
        }
        info
    }
}

impl std::fmt::Display for GateInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gammas: Vec<String> = self.gammas.iter().map(u32::to_string).collect();
        write!(f, "{} {}", self.kind, gammas.join(" - "))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Spectrum {
    pub gate: GateInfo,
    pub counts: Vec<f64>,
}

impl Spectrum {
    pub fn from_counts(name: &str, counts: Vec<f64>) -> Self {
        Self {
            gate: GateInfo::from_name(name),
            counts,
        }
    }

    /// Reads a text spectrum: a header line followed by one count per line.
    pub fn from_txt(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let counts = text
            .lines()
            .enumerate()
            .skip(1)
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                line.trim().parse::<f64>().map_err(|_| DataError::Parse {
                    line: i + 1,
                    content: line.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if counts.is_empty() {
            return Err(DataError::Empty(path.display().to_string()));
        }

        log::info!("Loaded {} bins from {}", counts.len(), path.display());
        Ok(Self {
            gate: GateInfo::from_path(path),
            counts,
        })
    }

    pub fn name(&self) -> &str {
        &self.gate.name
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Bin indices and counts, optionally limited to the index range `start..end`.
    pub fn get_spectrum(&self, slice: Option<(usize, usize)>) -> (Vec<f64>, Vec<f64>) {
        let (start, end) = slice.unwrap_or((0, self.counts.len()));
        let end = end.min(self.counts.len());
        let start = start.min(end);

        let x = (start..end).map(|i| i as f64).collect();
        let y = self.counts[start..end].to_vec();
        (x, y)
    }
}
