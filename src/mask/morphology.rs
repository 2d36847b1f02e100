//! 3×3 binary erosion/dilation and the opening built from them.
//!
//! The outermost 1-pixel ring of the output is always background: a full
//! neighbourhood is not available there, so it is never evaluated.
use crate::image::{ImageView, MaskU8, BACKGROUND, FOREGROUND};
use crate::schedule::RowYield;

#[derive(Clone, Copy)]
enum Window {
    Min,
    Max,
}

fn window_pass(src: &MaskU8, dst: &mut MaskU8, window: Window, rows: &mut RowYield) {
    debug_assert_eq!((src.w, src.h), (dst.w, dst.h));
    dst.data.fill(BACKGROUND);
    let (w, h) = (src.w, src.h);
    if w < 3 || h < 3 {
        return;
    }
    for y in 1..h - 1 {
        let prev = src.row(y - 1);
        let cur = src.row(y);
        let next = src.row(y + 1);
        let start = dst.idx(0, y);
        let out = &mut dst.data[start..start + w];
        for x in 1..w - 1 {
            #[rustfmt::skip]
            let hood = [
                prev[x - 1], prev[x], prev[x + 1],
                cur[x - 1], cur[x], cur[x + 1],
                next[x - 1], next[x], next[x + 1],
            ];
            let hit = match window {
                Window::Min => hood.iter().all(|&v| v != BACKGROUND),
                Window::Max => hood.iter().any(|&v| v != BACKGROUND),
            };
            out[x] = if hit { FOREGROUND } else { BACKGROUND };
        }
        rows.row_done(y);
    }
}

/// Pixel becomes the minimum of its 3×3 neighbourhood.
pub fn erode3x3(src: &MaskU8, dst: &mut MaskU8, rows: &mut RowYield) {
    window_pass(src, dst, Window::Min, rows);
}

/// Pixel becomes the maximum of its 3×3 neighbourhood.
pub fn dilate3x3(src: &MaskU8, dst: &mut MaskU8, rows: &mut RowYield) {
    window_pass(src, dst, Window::Max, rows);
}

/// Erode `mask` into `scratch`, then dilate back into `mask`.
pub fn open3x3(mask: &mut MaskU8, scratch: &mut MaskU8, rows: &mut RowYield) {
    erode3x3(mask, scratch, rows);
    dilate3x3(scratch, mask, rows);
}
