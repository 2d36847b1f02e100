//! JSON configuration for the binaries.
//!
//! Both loaders read the whole file and report failures as strings naming
//! the path, so the binaries can print them and exit.
mod counter;
mod runtime;

pub use counter::{load_tool_config, CounterOutputConfig, CounterToolConfig};
pub use runtime::{load_runtime_config, RuntimeConfig};

use crate::pipeline::PipelineParams;
use crate::settings::DisplaySize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Processing knobs shared by the runtime and the one-shot tool.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub display: DisplaySize,
    pub label_capacity: u32,
    /// Rows between cooperative yields (0 = never).
    pub yield_every_rows: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        let p = PipelineParams::default();
        Self {
            display: p.display,
            label_capacity: p.label_capacity,
            yield_every_rows: p.yield_every_rows,
        }
    }
}

impl ProcessingConfig {
    pub fn pipeline_params(&self) -> PipelineParams {
        PipelineParams {
            display: self.display,
            label_capacity: self.label_capacity,
            yield_every_rows: self.yield_every_rows,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
