use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogFileCandidate {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub size_bytes: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSource {
    Log { path: PathBuf },
    Settings { path: PathBuf },
}

impl ModelSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Log { .. } => "log",
            Self::Settings { .. } => "settings",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Log { path } | Self::Settings { path } => path,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Detection {
    pub model: Option<String>,
    pub source: Option<ModelSource>,
}

impl Detection {
    pub fn not_detected() -> Self {
        Self::default()
    }

    pub fn found(model: String, source: ModelSource) -> Self {
        Self {
            model: Some(model),
            source: Some(source),
        }
    }
}

/// Steady-state text shown by the indicator once a detection has resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusView {
    pub text: String,
    pub tooltip: String,
    pub model: Option<String>,
}
