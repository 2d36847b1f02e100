//! Global adaptive threshold derived from the frame mean.
use crate::image::{ImageU8, ImageView, MaskU8, BACKGROUND, FOREGROUND};
use crate::schedule::RowYield;

/// Safety band the derived threshold is always clamped into.
pub const THRESHOLD_FLOOR: i32 = 20;
pub const THRESHOLD_CEIL: i32 = 230;

/// Arithmetic mean luminance (integer division). Empty frames yield 0.
pub fn mean_brightness(frame: &ImageU8) -> u8 {
    let count = (frame.w * frame.h) as u64;
    if count == 0 {
        return 0;
    }
    let sum: u64 = frame
        .rows()
        .map(|row| row.iter().map(|&v| v as u64).sum::<u64>())
        .sum();
    (sum / count) as u8
}

/// `mean - offset`, clamped into `[THRESHOLD_FLOOR, THRESHOLD_CEIL]`
/// whatever the configured offset.
pub fn derive_threshold(mean: u8, offset: i32) -> u8 {
    (mean as i32 - offset).clamp(THRESHOLD_FLOOR, THRESHOLD_CEIL) as u8
}

/// Foreground where the pixel is strictly darker than `threshold`.
///
/// `out` must have the frame's dimensions.
pub fn binarize_into(frame: &ImageU8, threshold: u8, out: &mut MaskU8, rows: &mut RowYield) {
    debug_assert_eq!((out.w, out.h), (frame.w, frame.h));
    for y in 0..frame.h {
        let src = frame.row(y);
        let start = out.idx(0, y);
        let dst = &mut out.data[start..start + frame.w];
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = if s < threshold { FOREGROUND } else { BACKGROUND };
        }
        rows.row_done(y);
    }
}
