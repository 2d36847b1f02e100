//! Error types shared by the pipeline stages and the settings store.
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage that owns a working buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Mask,
    Roi,
    Labeling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Mask => "mask",
            Stage::Roi => "roi",
            Stage::Labeling => "labeling",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage} stage could not allocate {bytes} bytes")]
    AllocationFailed { stage: Stage, bytes: usize },

    #[error("region of interest is empty ({width}x{height})")]
    EmptyRoi { width: usize, height: usize },

    #[error("frame {width}x{height} is too small to process")]
    FrameTooSmall { width: usize, height: usize },

    #[error("no frame available")]
    NoFrame,

    #[error("frame source failed to initialise: {0}")]
    SourceInit(String),
}

impl PipelineError {
    /// Transient errors abandon the current cycle only; the next one retries.
    pub fn is_transient(&self) -> bool {
        !matches!(self, PipelineError::SourceInit(_))
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
