use super::{read_json, ProcessingConfig};
use crate::command::DEFAULT_LINE_CAPACITY;
use crate::pipeline::ControllerParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration of the interactive `parts_counter` runtime.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub processing: ProcessingConfig,
    /// Grayscale images served in a loop as camera frames.
    pub frames: Vec<PathBuf>,
    /// Frames the source may have on loan at once.
    pub frame_buffers: usize,
    /// Persisted tunables.
    pub settings_path: PathBuf,
    pub cycle_delay_ms: u64,
    /// Simulated mode-toggle press every N cycles (0 = never).
    pub mode_toggle_every: u64,
    pub line_capacity: usize,
    /// Where the rendered view is saved after the run.
    pub render_dir: Option<PathBuf>,
    /// Stop after this many cycles; run until stdin closes otherwise.
    pub max_cycles: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            processing: ProcessingConfig::default(),
            frames: Vec::new(),
            frame_buffers: 2,
            settings_path: PathBuf::from("parts_counter_settings.json"),
            cycle_delay_ms: 20,
            mode_toggle_every: 0,
            line_capacity: DEFAULT_LINE_CAPACITY,
            render_dir: None,
            max_cycles: None,
        }
    }
}

impl RuntimeConfig {
    pub fn controller_params(&self) -> ControllerParams {
        ControllerParams {
            pipeline: self.processing.pipeline_params(),
            cycle_delay: Duration::from_millis(self.cycle_delay_ms),
            line_capacity: self.line_capacity,
        }
    }
}

pub fn load_runtime_config(path: &Path) -> Result<RuntimeConfig, String> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        fs::write(
            &path,
            r#"{ "frames": ["a.png"], "mode_toggle_every": 50, "processing": { "label_capacity": 512 } }"#,
        )
        .unwrap();
        let cfg = load_runtime_config(&path).unwrap();
        assert_eq!(cfg.frames, vec![PathBuf::from("a.png")]);
        assert_eq!(cfg.mode_toggle_every, 50);
        assert_eq!(cfg.cycle_delay_ms, 20);
        assert_eq!(cfg.frame_buffers, 2);

        let params = cfg.controller_params();
        assert_eq!(params.pipeline.label_capacity, 512);
        assert_eq!(params.pipeline.yield_every_rows, 16);
        assert_eq!(params.cycle_delay, Duration::from_millis(20));
    }

    #[test]
    fn malformed_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        fs::write(&path, "{ frames: ").unwrap();
        let err = load_runtime_config(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
    }
}
