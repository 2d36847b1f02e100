//! Two-pass connected-component labeling with area-filtered counting.
//!
//! Forward pass
//! - 4-connectivity: only the left and top neighbours are inspected.
//! - Neither labeled: issue a new label. One labeled: inherit it. Both
//!   labeled and different: inherit the left label and union the two.
//! - The outermost ring of the ROI is skipped (no full neighbourhood).
//!
//! Second pass resolves every label to its root and accumulates areas. The
//! count is the number of roots whose area lies in `[min_area, max_area]`.
//!
//! Working buffers are a `u32` label map the size of the ROI and the forest
//! itself, bounded by `label_capacity`.

pub mod union_find;

pub use union_find::LabelForest;

use crate::error::{PipelineError, Stage};
use crate::image::mask::try_zeroed;
use crate::image::{ImageView, MaskU8, BACKGROUND};
use crate::schedule::RowYield;
use log::{debug, warn};
use serde::Serialize;

pub const DEFAULT_LABEL_CAPACITY: u32 = 2048;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResult {
    /// Components whose area is inside the configured bounds.
    pub count: usize,
    /// All resolved components, regardless of area.
    pub components: usize,
    pub rejected_small: usize,
    pub rejected_large: usize,
    pub labels_issued: u32,
    pub label_capacity: u32,
    /// Pixels that needed a fresh label after the space was exhausted.
    pub saturated_pixels: usize,
}

impl CountResult {
    /// True when label reuse may have merged unrelated blobs.
    pub fn is_saturated(&self) -> bool {
        self.saturated_pixels > 0
    }
}

pub fn count_components(
    roi: &MaskU8,
    min_area: i32,
    max_area: i32,
    label_capacity: u32,
    rows: &mut RowYield,
) -> Result<CountResult, PipelineError> {
    let (w, h) = (roi.w, roi.h);
    let mut labels = try_zeroed::<u32>(w * h, Stage::Labeling)?;
    let mut forest = LabelForest::new(label_capacity)?;

    if w >= 3 && h >= 3 {
        for y in 1..h - 1 {
            let row = roi.row(y);
            for x in 1..w - 1 {
                if row[x] == BACKGROUND {
                    continue;
                }
                let i = y * w + x;
                let left = labels[i - 1];
                let top = labels[i - w];
                labels[i] = match (left, top) {
                    (0, 0) => forest.issue(),
                    (l, 0) => l,
                    (0, t) => t,
                    (l, t) => {
                        if l != t {
                            forest.union(l, t);
                        }
                        l
                    }
                };
            }
            rows.row_done(y);
        }
    }

    let mut areas = try_zeroed::<u32>(forest.capacity() as usize + 1, Stage::Labeling)?;
    for &label in labels.iter().filter(|&&l| l != 0) {
        let root = forest.find(label);
        areas[root as usize] += 1;
    }

    let min_area = min_area.max(0) as u32;
    let max_area = max_area.max(0) as u32;
    let mut result = CountResult {
        labels_issued: forest.issued(),
        label_capacity: forest.capacity(),
        saturated_pixels: forest.saturated(),
        ..CountResult::default()
    };
    for &area in areas.iter().filter(|&&a| a > 0) {
        result.components += 1;
        if area < min_area {
            result.rejected_small += 1;
        } else if area > max_area {
            result.rejected_large += 1;
        } else {
            result.count += 1;
        }
    }

    if result.is_saturated() {
        warn!(
            "label space exhausted: capacity={} reused for {} pixels, count may be low",
            result.label_capacity, result.saturated_pixels
        );
    }
    debug!(
        "count_components {}x{} components={} counted={} labels={}/{}",
        w, h, result.components, result.count, result.labels_issued, result.label_capacity
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::FOREGROUND;
    use crate::schedule::NoYield;

    fn paint(mask: &mut MaskU8, x0: usize, y0: usize, w: usize, h: usize) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.set(x, y, FOREGROUND);
            }
        }
    }

    fn count(mask: &MaskU8, min: i32, max: i32, capacity: u32) -> CountResult {
        let mut hook = NoYield;
        count_components(mask, min, max, capacity, &mut RowYield::new(&mut hook, 0)).unwrap()
    }

    #[test]
    fn solid_rectangle_counts_once() {
        let mut m = MaskU8::try_new(64, 64, Stage::Roi).unwrap();
        paint(&mut m, 10, 10, 20, 15);
        let r = count(&m, 30, 900, DEFAULT_LABEL_CAPACITY);
        assert_eq!(r.count, 1);
        assert_eq!(r.components, 1);
    }

    #[test]
    fn two_disjoint_rectangles_count_twice() {
        let mut m = MaskU8::try_new(64, 64, Stage::Roi).unwrap();
        paint(&mut m, 5, 5, 10, 5);
        paint(&mut m, 30, 30, 5, 10);
        let r = count(&m, 45, 900, DEFAULT_LABEL_CAPACITY);
        assert_eq!(r.count, 2);
    }

    #[test]
    fn single_pixel_is_too_small() {
        let mut m = MaskU8::try_new(16, 16, Stage::Roi).unwrap();
        m.set(8, 8, FOREGROUND);
        let r = count(&m, 45, 900, DEFAULT_LABEL_CAPACITY);
        assert_eq!(r.count, 0);
        assert_eq!(r.rejected_small, 1);
    }

    #[test]
    fn area_bounds_are_inclusive() {
        let mut m = MaskU8::try_new(40, 40, Stage::Roi).unwrap();
        paint(&mut m, 2, 2, 9, 5);
        assert_eq!(count(&m, 45, 45, 16).count, 1);
        assert_eq!(count(&m, 46, 900, 16).count, 0);
        assert_eq!(count(&m, 1, 44, 16).rejected_large, 1);
    }

    #[test]
    fn u_shape_merges_through_union() {
        // Two arms that only join at the bottom get different provisional
        // labels and must be merged.
        let mut m = MaskU8::try_new(20, 20, Stage::Roi).unwrap();
        paint(&mut m, 2, 2, 3, 10);
        paint(&mut m, 10, 2, 3, 10);
        paint(&mut m, 2, 12, 11, 3);
        let r = count(&m, 1, 10_000, 16);
        assert_eq!(r.components, 1);
        assert_eq!(r.labels_issued, 2);
    }

    #[test]
    fn border_ring_is_not_labeled() {
        let mut m = MaskU8::try_new(10, 10, Stage::Roi).unwrap();
        paint(&mut m, 0, 0, 10, 1);
        paint(&mut m, 0, 0, 1, 10);
        let r = count(&m, 1, 100, 16);
        assert_eq!(r.components, 0);
    }

    #[test]
    fn diagonal_pixels_are_separate_components() {
        let mut m = MaskU8::try_new(10, 10, Stage::Roi).unwrap();
        m.set(3, 3, FOREGROUND);
        m.set(4, 4, FOREGROUND);
        let r = count(&m, 1, 100, 16);
        assert_eq!(r.components, 2);
    }

    #[test]
    fn saturation_is_observable_and_undercounts() {
        let mut m = MaskU8::try_new(40, 10, Stage::Roi).unwrap();
        for i in 0..6 {
            paint(&mut m, 2 + i * 6, 2, 3, 3);
        }
        let r = count(&m, 1, 100, 4);
        assert!(r.is_saturated());
        assert_eq!(r.labels_issued, 4);
        assert_eq!(r.saturated_pixels, 2);
        assert_eq!(r.components, 4);

        let full = count(&m, 1, 100, 64);
        assert!(!full.is_saturated());
        assert_eq!(full.count, 6);
    }

    #[test]
    fn tiny_roi_yields_nothing() {
        let mut m = MaskU8::try_new(2, 2, Stage::Roi).unwrap();
        m.data.fill(FOREGROUND);
        let expected = CountResult {
            label_capacity: 16,
            ..CountResult::default()
        };
        assert_eq!(count(&m, 1, 10, 16), expected);
    }
}
