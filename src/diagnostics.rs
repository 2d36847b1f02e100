//! Per-cycle report returned by the pipeline and written as a status line.
//!
//! The structured form serializes to camelCase JSON for tooling; the
//! one-line form goes to the command channel once per cycle and is purely
//! informational.
use crate::labeling::CountResult;
use crate::roi::RoiGeometry;
use crate::settings::Settings;
use crate::types::DisplayMode;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
}

/// ROI rectangle in display coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiDescriptor {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl From<&RoiGeometry> for RoiDescriptor {
    fn from(g: &RoiGeometry) -> Self {
        Self {
            x: g.roi_x,
            y: g.roi_y,
            width: g.roi_w,
            height: g.roi_h,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub mask_ms: f64,
    pub roi_ms: f64,
    pub count_ms: f64,
    pub total_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub input: InputDescriptor,
    pub mode: DisplayMode,
    pub mean: u8,
    pub threshold: u8,
    pub roi: RoiDescriptor,
    pub counts: CountResult,
    pub settings: Settings,
    pub timings: TimingBreakdown,
}

impl CycleReport {
    pub fn count(&self) -> usize {
        self.counts.count
    }

    /// One-line summary: count, statistics, every setting and the mode.
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "count={} mean={} thr={} {} mode={}",
            self.counts.count, self.mean, self.threshold, self.settings, self.mode
        );
        if self.counts.is_saturated() {
            let _ = write!(line, " saturated={}", self.counts.saturated_pixels);
        }
        line
    }
}
