#![doc = include_str!("../README.md")]

// Pipeline stages and their data.
pub mod image;
pub mod labeling;
pub mod mask;
pub mod roi;
pub mod settings;
pub mod types;

// Orchestration, control protocol and output.
pub mod command;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod schedule;

// Binary-facing configuration.
pub mod config;

// --- High-level re-exports -------------------------------------------------

pub use crate::diagnostics::CycleReport;
pub use crate::error::{PipelineError, SettingsError};
pub use crate::pipeline::{CycleOutput, PartsCounter, PipelineParams};
pub use crate::settings::{DisplaySize, Settings, SettingsStore};
pub use crate::types::DisplayMode;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use parts_counter::prelude::*;
///
/// # fn main() {
/// let (w, h) = (320usize, 240usize);
/// let gray = vec![128u8; w * h];
/// let img = ImageU8 { w, h, stride: w, data: &gray };
///
/// let mut counter = PartsCounter::new(PipelineParams::default());
/// let out = counter
///     .process(&img, &Settings::default(), DisplayMode::Info)
///     .expect("cycle");
/// println!("{}", out.report.status_line());
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageU8;
    pub use crate::{DisplayMode, PartsCounter, PipelineParams, Settings};
}
