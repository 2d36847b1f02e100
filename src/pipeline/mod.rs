//! Per-cycle counting pipeline and the control loop driving it.
//!
//! Overview
//! - [`PartsCounter`] runs one cycle on a borrowed frame: mask → ROI →
//!   labeling. Settings are borrowed for the cycle only.
//! - Every working buffer (mask, scratch, ROI mask, label map, forest) is
//!   allocated for the cycle and dropped before the next one. The full-frame
//!   mask is released as soon as the ROI has been extracted.
//! - Allocation failures and an empty ROI abort the cycle with a transient
//!   [`PipelineError`]; nothing is retried within the cycle.
//!
//! Modules
//! - `source` – frame source seam and the release-exactly-once lease.
//! - `controller` – the single-threaded poll loop (commands, mode toggle,
//!   acquire, process, render, release, sleep).

mod controller;
mod source;

pub use controller::{
    CommandChannel, Controller, ControllerParams, ModeInput, PeriodicToggle, StepOutcome,
};
pub use source::{FrameLease, FrameSource, ImageSequenceSource};

use crate::diagnostics::{CycleReport, InputDescriptor, RoiDescriptor, TimingBreakdown};
use crate::error::PipelineError;
use crate::image::{ImageU8, MaskU8};
use crate::labeling::{count_components, DEFAULT_LABEL_CAPACITY};
use crate::mask::build_mask;
use crate::roi::{extract_roi, RoiGeometry};
use crate::schedule::{CooperativeYield, NoYield, RowYield};
use crate::settings::{DisplaySize, Settings};
use crate::types::DisplayMode;
use log::debug;
use std::time::Instant;

/// Static knobs that do not change while running.
#[derive(Clone, Debug)]
pub struct PipelineParams {
    /// Rendered view the crop margins refer to.
    pub display: DisplaySize,
    /// Upper bound on provisional labels per cycle.
    pub label_capacity: u32,
    /// Rows between cooperative yields in pixel loops (0 = never).
    pub yield_every_rows: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            display: DisplaySize::default(),
            label_capacity: DEFAULT_LABEL_CAPACITY,
            yield_every_rows: 16,
        }
    }
}

/// Everything the renderer may need from one cycle.
#[derive(Clone, Debug)]
pub struct CycleOutput {
    pub report: CycleReport,
    pub geometry: RoiGeometry,
    pub roi_mask: MaskU8,
}

pub struct PartsCounter {
    params: PipelineParams,
    hook: Box<dyn CooperativeYield>,
}

impl PartsCounter {
    pub fn new(params: PipelineParams) -> Self {
        Self::with_yield(params, Box::new(NoYield))
    }

    /// Use a platform scheduling hook inside the long pixel loops.
    pub fn with_yield(params: PipelineParams, hook: Box<dyn CooperativeYield>) -> Self {
        Self { params, hook }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Run one cycle on `frame` with the settings as they are right now.
    pub fn process(
        &mut self,
        frame: &ImageU8,
        settings: &Settings,
        mode: DisplayMode,
    ) -> Result<CycleOutput, PipelineError> {
        let total_start = Instant::now();
        let mut rows = RowYield::new(self.hook.as_mut(), self.params.yield_every_rows);

        let mask_start = Instant::now();
        let masked = build_mask(frame, settings.threshold_offset, &mut rows)?;
        let mask_ms = mask_start.elapsed().as_secs_f64() * 1000.0;

        let roi_start = Instant::now();
        let geometry = RoiGeometry::new(frame.w, frame.h, self.params.display, settings)?;
        let roi_mask = extract_roi(&masked.mask, &geometry, &mut rows)?;
        drop(masked.mask);
        let roi_ms = roi_start.elapsed().as_secs_f64() * 1000.0;

        let count_start = Instant::now();
        let counts = count_components(
            &roi_mask,
            settings.min_area,
            settings.max_area,
            self.params.label_capacity,
            &mut rows,
        )?;
        let count_ms = count_start.elapsed().as_secs_f64() * 1000.0;

        let timings = TimingBreakdown {
            mask_ms,
            roi_ms,
            count_ms,
            total_ms: total_start.elapsed().as_secs_f64() * 1000.0,
        };
        #[cfg(feature = "profile_stages")]
        debug!(
            "stage timings mask={:.3}ms roi={:.3}ms count={:.3}ms total={:.3}ms",
            timings.mask_ms, timings.roi_ms, timings.count_ms, timings.total_ms
        );
        debug!(
            "PartsCounter::process {}x{} count={} components={}",
            frame.w, frame.h, counts.count, counts.components
        );

        let report = CycleReport {
            input: InputDescriptor {
                width: frame.w,
                height: frame.h,
            },
            mode,
            mean: masked.mean,
            threshold: masked.threshold,
            roi: RoiDescriptor::from(&geometry),
            counts,
            settings: settings.clone(),
            timings,
        };
        Ok(CycleOutput {
            report,
            geometry,
            roi_mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CropSide;

    fn frame_with_blocks(
        w: usize,
        h: usize,
        bg: u8,
        blocks: &[(usize, usize, usize, usize)],
    ) -> Vec<u8> {
        let mut data = vec![bg; w * h];
        for &(x0, y0, bw, bh) in blocks {
            for y in y0..y0 + bh {
                for x in x0..x0 + bw {
                    data[y * w + x] = 0;
                }
            }
        }
        data
    }

    #[test]
    fn single_dark_square_counts_once() {
        let data = frame_with_blocks(320, 240, 122, &[(140, 100, 30, 30)]);
        let frame = ImageU8::packed(320, 240, &data);
        let mut counter = PartsCounter::new(PipelineParams::default());
        let out = counter
            .process(&frame, &Settings::default(), DisplayMode::Info)
            .unwrap();
        assert_eq!(out.report.mean, 120);
        assert_eq!(out.report.threshold, 80);
        assert_eq!(out.report.count(), 1);
        assert_eq!((out.roi_mask.w, out.roi_mask.h), (240, 240));
    }

    #[test]
    fn blocks_outside_the_view_are_ignored() {
        // Sensor columns below 40 are not shown on the 240-wide display.
        let data = frame_with_blocks(320, 240, 150, &[(5, 50, 20, 20), (150, 50, 20, 20)]);
        let frame = ImageU8::packed(320, 240, &data);
        let mut counter = PartsCounter::new(PipelineParams::default());
        let out = counter
            .process(&frame, &Settings::default(), DisplayMode::Mask)
            .unwrap();
        assert_eq!(out.report.count(), 1);
    }

    #[test]
    fn crop_can_exclude_a_part() {
        // Sensor x 200..220 shows at display x 60..80 and sensor x 60..80 at
        // display x 200..220; a right crop of 120 keeps only the first.
        let data = frame_with_blocks(320, 240, 150, &[(200, 50, 20, 20), (60, 50, 20, 20)]);
        let frame = ImageU8::packed(320, 240, &data);
        let mut counter = PartsCounter::new(PipelineParams::default());
        let mut settings = Settings::default();
        assert_eq!(
            counter.process(&frame, &settings, DisplayMode::Info).unwrap().report.count(),
            2
        );
        settings.set_crop(CropSide::Right, 120, DisplaySize::default());
        let out = counter.process(&frame, &settings, DisplayMode::Info).unwrap();
        assert_eq!(out.report.roi.width, 120);
        assert_eq!(out.report.count(), 1);
    }

    #[test]
    fn unclamped_empty_roi_is_a_transient_error() {
        let data = vec![100u8; 320 * 240];
        let frame = ImageU8::packed(320, 240, &data);
        let settings = Settings {
            crop_top: 200,
            crop_bottom: 40,
            ..Settings::default()
        };
        let mut counter = PartsCounter::new(PipelineParams::default());
        let err = counter
            .process(&frame, &settings, DisplayMode::Info)
            .unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, PipelineError::EmptyRoi { .. }));
    }
}
