//! Full-frame binary mask: adaptive threshold followed by a 3×3 opening.
//!
//! Steps
//! 1. Mean luminance over all pixels (64-bit accumulator).
//! 2. Threshold `mean - offset`, clamped into `[20, 230]` so extreme scenes
//!    cannot collapse the mask to all-foreground or all-background.
//! 3. Binarize: foreground (255) where the pixel is strictly darker.
//! 4. Opening (3×3 erosion then 3×3 dilation) to drop sub-kernel speckle
//!    while roughly preserving blob area.
//!
//! Two working buffers are needed; failing to obtain either is reported as
//! [`PipelineError::AllocationFailed`] and the caller skips the cycle.

pub mod morphology;
pub mod threshold;

pub use morphology::{dilate3x3, erode3x3, open3x3};
pub use threshold::{binarize_into, derive_threshold, mean_brightness};

use crate::error::{PipelineError, Stage};
use crate::image::{ImageU8, MaskU8};
use crate::schedule::RowYield;
use log::debug;

/// Mask plus the statistics used to derive it.
#[derive(Clone, Debug)]
pub struct MaskOutput {
    pub mask: MaskU8,
    pub mean: u8,
    pub threshold: u8,
}

pub fn build_mask(
    frame: &ImageU8,
    threshold_offset: i32,
    rows: &mut RowYield,
) -> Result<MaskOutput, PipelineError> {
    if frame.w == 0 || frame.h == 0 {
        return Err(PipelineError::FrameTooSmall {
            width: frame.w,
            height: frame.h,
        });
    }
    let mean = mean_brightness(frame);
    let threshold = derive_threshold(mean, threshold_offset);

    let mut mask = MaskU8::try_new(frame.w, frame.h, Stage::Mask)?;
    let mut scratch = MaskU8::try_new(frame.w, frame.h, Stage::Mask)?;

    binarize_into(frame, threshold, &mut mask, rows);
    open3x3(&mut mask, &mut scratch, rows);
    debug!(
        "build_mask {}x{} mean={} offset={} threshold={}",
        frame.w, frame.h, mean, threshold_offset, threshold
    );

    Ok(MaskOutput {
        mask,
        mean,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{CountingYield, NoYield};

    #[test]
    fn dark_square_on_bright_background_survives() {
        let (w, h) = (32usize, 32usize);
        let mut data = vec![200u8; w * h];
        for y in 8..16 {
            for x in 10..20 {
                data[y * w + x] = 5;
            }
        }
        let frame = ImageU8::packed(w, h, &data);
        let mut hook = NoYield;
        let out = build_mask(&frame, 40, &mut RowYield::new(&mut hook, 0)).unwrap();
        assert_eq!(out.mask.foreground_count(), 80);
        assert!(out.mask.is_foreground(10, 8));
        assert!(!out.mask.is_foreground(9, 8));
    }

    #[test]
    fn uniform_frame_gives_empty_mask() {
        let data = vec![90u8; 24 * 24];
        let frame = ImageU8::packed(24, 24, &data);
        let mut hook = NoYield;
        let out = build_mask(&frame, 0, &mut RowYield::new(&mut hook, 0)).unwrap();
        assert_eq!(out.mean, 90);
        assert_eq!(out.threshold, 90);
        assert_eq!(out.mask.foreground_count(), 0);
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = ImageU8::packed(0, 0, &[]);
        let mut hook = NoYield;
        let err = build_mask(&frame, 0, &mut RowYield::new(&mut hook, 0)).unwrap_err();
        assert!(matches!(err, PipelineError::FrameTooSmall { .. }));
    }

    #[test]
    fn long_passes_yield_periodically() {
        let data = vec![128u8; 64 * 64];
        let frame = ImageU8::packed(64, 64, &data);
        let mut hook = CountingYield::default();
        build_mask(&frame, 10, &mut RowYield::new(&mut hook, 8)).unwrap();
        assert!(hook.calls >= 3 * 7, "got {} yields", hook.calls);
    }
}
