use super::{read_json, ProcessingConfig};
use crate::settings::Settings;
use crate::types::DisplayMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration of the one-shot `count_image` tool.
#[derive(Debug, Deserialize)]
pub struct CounterToolConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Tunables for the run; clamped before use. Defaults when absent.
    #[serde(default)]
    pub settings: Settings,
    /// View to render into `output.view_image`.
    #[serde(default)]
    pub mode: DisplayMode,
    pub output: CounterOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct CounterOutputConfig {
    pub roi_mask_image: PathBuf,
    pub report_json: PathBuf,
    #[serde(default)]
    pub view_image: Option<PathBuf>,
}

pub fn load_tool_config(path: &Path) -> Result<CounterToolConfig, String> {
    read_json(path)
}
