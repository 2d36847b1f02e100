//! Region-of-interest extraction from the full-frame mask.
//!
//! The crop margins are expressed in the rendered view, which is a centred,
//! 180°-rotated window onto the sensor. [`RoiGeometry`] holds the composed
//! transform; [`extract_roi`] resamples the mask through it so that ROI pixel
//! `(rx, ry)` is exactly what the display shows at `(rx + left, ry + top)`.
//! Pixels mapping outside the sensor read as background.

pub mod geometry;

pub use geometry::{centered_offset, RoiGeometry};

use crate::error::{PipelineError, Stage};
use crate::image::{MaskU8, BACKGROUND};
use crate::schedule::RowYield;
use log::debug;

pub fn extract_roi(
    mask: &MaskU8,
    geometry: &RoiGeometry,
    rows: &mut RowYield,
) -> Result<MaskU8, PipelineError> {
    debug_assert_eq!((mask.w, mask.h), (geometry.sensor_w, geometry.sensor_h));
    if geometry.roi_w == 0 || geometry.roi_h == 0 {
        return Err(PipelineError::EmptyRoi {
            width: geometry.roi_w,
            height: geometry.roi_h,
        });
    }
    let mut roi = MaskU8::try_new(geometry.roi_w, geometry.roi_h, Stage::Roi)?;
    for ry in 0..geometry.roi_h {
        let start = roi.idx(0, ry);
        let out = &mut roi.data[start..start + geometry.roi_w];
        for (rx, px) in out.iter_mut().enumerate() {
            *px = match geometry.roi_to_sensor(rx, ry) {
                Some((sx, sy)) => mask.get(sx, sy),
                None => BACKGROUND,
            };
        }
        rows.row_done(ry);
    }
    debug!(
        "extract_roi {}x{} at ({}, {}) foreground={}",
        roi.w,
        roi.h,
        geometry.roi_x,
        geometry.roi_y,
        roi.foreground_count()
    );
    Ok(roi)
}
