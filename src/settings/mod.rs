//! Tunable counting parameters and their invariants.
//!
//! [`Settings`] is a plain value: downstream stages receive `&Settings` at
//! the start of a cycle and never keep it. Every mutation goes through a
//! setter that re-establishes the invariants via [`Settings::clamp`]:
//!
//! - `threshold_offset` in `[0, 80]`
//! - `1 <= min_area < max_area <= 60000`
//! - on each display axis at least two rows/columns survive the crops
//!   (`left + right <= width - 2`, `top + bottom <= height - 2`)
//!
//! Out-of-range input is clamped to the nearest valid value, never rejected.

mod store;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore, SettingsStore};

use serde::{Deserialize, Serialize};
use std::fmt;

pub const OFFSET_MAX: i32 = 80;
pub const AREA_MIN: i32 = 1;
pub const AREA_MAX: i32 = 60_000;

pub const DEFAULT_OFFSET: i32 = 40;
pub const DEFAULT_MIN_AREA: i32 = 45;
pub const DEFAULT_MAX_AREA: i32 = 900;
pub const DEFAULT_AUTO_SAVE: bool = true;

/// Dimensions of the rendered view the crop margins are measured in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: usize,
    pub height: usize,
}

impl DisplaySize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Largest combined margin that still leaves two lines on an axis of
    /// `extent` pixels.
    fn margin_budget(extent: usize) -> i32 {
        i32::try_from(extent.saturating_sub(2)).unwrap_or(i32::MAX)
    }
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self::new(240, 240)
    }
}

/// One of the four ROI edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl CropSide {
    pub fn opposite(self) -> Self {
        match self {
            CropSide::Left => CropSide::Right,
            CropSide::Right => CropSide::Left,
            CropSide::Top => CropSide::Bottom,
            CropSide::Bottom => CropSide::Top,
        }
    }

    /// Accepts `l`/`left`, `r`/`right`, `t`/`top`, `b`/`bottom`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "l" | "left" => Some(CropSide::Left),
            "r" | "right" => Some(CropSide::Right),
            "t" | "top" => Some(CropSide::Top),
            "b" | "bottom" => Some(CropSide::Bottom),
            _ => None,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, CropSide::Left | CropSide::Right)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Bias subtracted from the mean brightness to obtain the threshold.
    pub threshold_offset: i32,
    /// Smallest blob area (pixels, inclusive) that counts as a part.
    pub min_area: i32,
    /// Largest blob area (pixels, inclusive) that counts as a part.
    pub max_area: i32,
    /// Persist each validated mutation immediately.
    pub auto_save: bool,
    pub crop_left: i32,
    pub crop_right: i32,
    pub crop_top: i32,
    pub crop_bottom: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold_offset: DEFAULT_OFFSET,
            min_area: DEFAULT_MIN_AREA,
            max_area: DEFAULT_MAX_AREA,
            auto_save: DEFAULT_AUTO_SAVE,
            crop_left: 0,
            crop_right: 0,
            crop_top: 0,
            crop_bottom: 0,
        }
    }
}

impl Settings {
    /// Enforce every invariant. Idempotent.
    pub fn clamp(&mut self, display: DisplaySize) {
        self.threshold_offset = self.threshold_offset.clamp(0, OFFSET_MAX);

        self.min_area = self.min_area.clamp(AREA_MIN, AREA_MAX - 1);
        self.max_area = self.max_area.clamp(self.min_area + 1, AREA_MAX);

        let (left, right) = fit_margins(
            self.crop_left,
            self.crop_right,
            DisplaySize::margin_budget(display.width),
        );
        self.crop_left = left;
        self.crop_right = right;

        let (top, bottom) = fit_margins(
            self.crop_top,
            self.crop_bottom,
            DisplaySize::margin_budget(display.height),
        );
        self.crop_top = top;
        self.crop_bottom = bottom;
    }

    pub fn set_threshold_offset(&mut self, value: i64, display: DisplaySize) {
        self.threshold_offset = saturate(value);
        self.clamp(display);
    }

    /// Raising `min_area` to or past `max_area` drags `max_area` along.
    pub fn set_min_area(&mut self, value: i64, display: DisplaySize) {
        self.min_area = saturate(value);
        self.clamp(display);
    }

    /// `max_area` never drops below `min_area + 1`.
    pub fn set_max_area(&mut self, value: i64, display: DisplaySize) {
        self.max_area = saturate(value);
        self.clamp(display);
    }

    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save = enabled;
    }

    /// Set one crop margin. When the ROI would lose its last rows/columns the
    /// opposite margin on the same axis gives way first.
    pub fn set_crop(&mut self, side: CropSide, value: i64, display: DisplaySize) {
        let budget = if side.is_horizontal() {
            DisplaySize::margin_budget(display.width)
        } else {
            DisplaySize::margin_budget(display.height)
        };
        let value = saturate(value).clamp(0, budget);
        *self.crop_mut(side) = value;
        let opposite = self.crop_mut(side.opposite());
        *opposite = (*opposite).min(budget - value);
        self.clamp(display);
    }

    pub fn crop(&self, side: CropSide) -> i32 {
        match side {
            CropSide::Left => self.crop_left,
            CropSide::Right => self.crop_right,
            CropSide::Top => self.crop_top,
            CropSide::Bottom => self.crop_bottom,
        }
    }

    fn crop_mut(&mut self, side: CropSide) -> &mut i32 {
        match side {
            CropSide::Left => &mut self.crop_left,
            CropSide::Right => &mut self.crop_right,
            CropSide::Top => &mut self.crop_top,
            CropSide::Bottom => &mut self.crop_bottom,
        }
    }

    /// ROI dimensions left after applying the crops to `display`.
    pub fn roi_size(&self, display: DisplaySize) -> (usize, usize) {
        let w = display.width as i64 - self.crop_left as i64 - self.crop_right as i64;
        let h = display.height as i64 - self.crop_top as i64 - self.crop_bottom as i64;
        (w.max(0) as usize, h.max(0) as usize)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset={} min={} max={} crop l={} r={} t={} b={} autosave={}",
            self.threshold_offset,
            self.min_area,
            self.max_area,
            self.crop_left,
            self.crop_right,
            self.crop_top,
            self.crop_bottom,
            if self.auto_save { "on" } else { "off" }
        )
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Clamp both margins to `[0, budget]`, then shrink the larger one (the
/// first on a tie) until their sum fits the budget.
fn fit_margins(first: i32, second: i32, budget: i32) -> (i32, i32) {
    let mut first = first.clamp(0, budget);
    let mut second = second.clamp(0, budget);
    let excess = first + second - budget;
    if excess <= 0 {
        return (first, second);
    }
    let (larger, smaller) = if first >= second {
        (&mut first, &mut second)
    } else {
        (&mut second, &mut first)
    };
    let take = excess.min(*larger);
    *larger -= take;
    *smaller -= excess - take;
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: DisplaySize = DisplaySize::new(240, 240);

    fn assert_invariants(s: &Settings, display: DisplaySize) {
        assert!((0..=OFFSET_MAX).contains(&s.threshold_offset));
        assert!(s.min_area >= AREA_MIN);
        assert!(s.max_area >= s.min_area + 1);
        assert!(s.max_area <= AREA_MAX);
        for side in [CropSide::Left, CropSide::Right, CropSide::Top, CropSide::Bottom] {
            assert!(s.crop(side) >= 0);
        }
        assert!(s.crop_left + s.crop_right <= display.width as i32 - 2);
        assert!(s.crop_top + s.crop_bottom <= display.height as i32 - 2);
    }

    #[test]
    fn defaults_already_satisfy_invariants() {
        let mut s = Settings::default();
        let before = s.clone();
        s.clamp(DISPLAY);
        assert_eq!(s, before);
        assert_invariants(&s, DISPLAY);
    }

    #[test]
    fn clamp_is_idempotent_on_wild_values() {
        let samples = [
            (-5, -10, -20, 500, 500, -3, 900),
            (200, 70_000, 10, 239, 239, 239, 239),
            (81, 60_000, 60_000, 0, 300, 120, 119),
            (0, 1, 1, 120, 120, 1, 1),
        ];
        for (offset, min, max, l, r, t, b) in samples {
            let mut s = Settings {
                threshold_offset: offset,
                min_area: min,
                max_area: max,
                auto_save: false,
                crop_left: l,
                crop_right: r,
                crop_top: t,
                crop_bottom: b,
            };
            s.clamp(DISPLAY);
            assert_invariants(&s, DISPLAY);
            let once = s.clone();
            s.clamp(DISPLAY);
            assert_eq!(s, once);
        }
    }

    #[test]
    fn max_below_min_is_raised() {
        let mut s = Settings::default();
        s.set_max_area(10, DISPLAY);
        assert_eq!(s.min_area, 45);
        assert_eq!(s.max_area, 46);
    }

    #[test]
    fn min_at_ceiling_pushes_max_to_limit() {
        let mut s = Settings::default();
        s.set_min_area(60_000, DISPLAY);
        assert_eq!(s.min_area, AREA_MAX - 1);
        assert_eq!(s.max_area, AREA_MAX);
    }

    #[test]
    fn offset_is_clamped_into_band() {
        let mut s = Settings::default();
        s.set_threshold_offset(500, DISPLAY);
        assert_eq!(s.threshold_offset, 80);
        s.set_threshold_offset(-1, DISPLAY);
        assert_eq!(s.threshold_offset, 0);
    }

    #[test]
    fn extreme_left_crop_keeps_columns() {
        let mut s = Settings::default();
        s.set_crop(CropSide::Left, 239, DISPLAY);
        let (w, h) = s.roi_size(DISPLAY);
        assert!(w >= 1, "ROI lost every column");
        assert_eq!(h, 240);
        assert_invariants(&s, DISPLAY);
    }

    #[test]
    fn crop_update_shrinks_opposite_margin() {
        let mut s = Settings::default();
        s.set_crop(CropSide::Right, 100, DISPLAY);
        s.set_crop(CropSide::Left, 200, DISPLAY);
        assert_eq!(s.crop_left, 200);
        assert_eq!(s.crop_right, 38);
        s.set_crop(CropSide::Bottom, 150, DISPLAY);
        s.set_crop(CropSide::Top, 150, DISPLAY);
        assert_eq!(s.crop_top, 150);
        assert_eq!(s.crop_bottom, 88);
    }

    #[test]
    fn fit_margins_shrinks_larger_first_and_left_on_tie() {
        assert_eq!(fit_margins(200, 100, 238), (138, 100));
        assert_eq!(fit_margins(50, 220, 238), (50, 188));
        assert_eq!(fit_margins(130, 130, 238), (108, 130));
        assert_eq!(fit_margins(238, 238, 238), (0, 238));
    }

    #[test]
    fn margin_budget_saturates_on_huge_extents() {
        assert_eq!(DisplaySize::margin_budget(240), 238);
        assert_eq!(DisplaySize::margin_budget(1), 0);
        assert_eq!(DisplaySize::margin_budget(1 << 40), i32::MAX);
    }

    #[test]
    fn display_lists_every_field() {
        let text = Settings::default().to_string();
        assert_eq!(
            text,
            "offset=40 min=45 max=900 crop l=0 r=0 t=0 b=0 autosave=on"
        );
    }
}
