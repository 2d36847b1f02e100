//! Coordinate transforms between the sensor frame, the rotated display and
//! the cropped region of interest.
//!
//! Three spaces are involved:
//!
//! - **sensor**: the raw frame, `sensor_w × sensor_h`.
//! - **display**: the rendered square `W × H`, rotated by 180° relative to
//!   the sensor and centred on it. Display `(x, y)` samples sensor-crop
//!   `(W-1-x, H-1-y)`, and sensor-crop `(cx, cy)` sits at sensor
//!   `(cx + off_x, cy + off_y)` with `off = (sensor - display) / 2`
//!   (negative when the sensor is the smaller one).
//! - **roi**: the display minus the four crop margins; ROI `(rx, ry)` is
//!   display `(rx + crop_left, ry + crop_top)`.
use crate::error::PipelineError;
use crate::settings::{DisplaySize, Settings};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiGeometry {
    pub sensor_w: usize,
    pub sensor_h: usize,
    pub display: DisplaySize,
    /// Sensor column of sensor-crop column 0.
    pub offset_x: isize,
    /// Sensor row of sensor-crop row 0.
    pub offset_y: isize,
    /// ROI origin in display coordinates.
    pub roi_x: usize,
    pub roi_y: usize,
    pub roi_w: usize,
    pub roi_h: usize,
}

/// Offset aligning the centre of a `display` extent with a `sensor` extent.
pub fn centered_offset(sensor: usize, display: usize) -> isize {
    (sensor as isize - display as isize) / 2
}

impl RoiGeometry {
    /// Build the mapping for one cycle.
    ///
    /// Fails with [`PipelineError::EmptyRoi`] when the crops leave no row or
    /// no column. Clamped settings never do, but the check stays.
    pub fn new(
        sensor_w: usize,
        sensor_h: usize,
        display: DisplaySize,
        settings: &Settings,
    ) -> Result<Self, PipelineError> {
        let (roi_w, roi_h) = settings.roi_size(display);
        if roi_w == 0 || roi_h == 0 {
            return Err(PipelineError::EmptyRoi {
                width: roi_w,
                height: roi_h,
            });
        }
        Ok(Self {
            sensor_w,
            sensor_h,
            display,
            offset_x: centered_offset(sensor_w, display.width),
            offset_y: centered_offset(sensor_h, display.height),
            roi_x: settings.crop_left.max(0) as usize,
            roi_y: settings.crop_top.max(0) as usize,
            roi_w,
            roi_h,
        })
    }

    /// Sensor pixel shown at display `(dx, dy)`, or `None` when it falls
    /// outside the sensor.
    ///
    /// Pre: `dx < W`, `dy < H`. Post: a returned `(sx, sy)` satisfies
    /// `sx < sensor_w`, `sy < sensor_h`.
    #[inline]
    pub fn display_to_sensor(&self, dx: usize, dy: usize) -> Option<(usize, usize)> {
        if dx >= self.display.width || dy >= self.display.height {
            return None;
        }
        let cx = (self.display.width - 1 - dx) as isize;
        let cy = (self.display.height - 1 - dy) as isize;
        let sx = cx + self.offset_x;
        let sy = cy + self.offset_y;
        if sx < 0 || sy < 0 || sx as usize >= self.sensor_w || sy as usize >= self.sensor_h {
            return None;
        }
        Some((sx as usize, sy as usize))
    }

    /// Display position of ROI pixel `(rx, ry)`.
    #[inline]
    pub fn roi_to_display(&self, rx: usize, ry: usize) -> (usize, usize) {
        (rx + self.roi_x, ry + self.roi_y)
    }

    /// Sensor pixel sampled by ROI pixel `(rx, ry)`.
    #[inline]
    pub fn roi_to_sensor(&self, rx: usize, ry: usize) -> Option<(usize, usize)> {
        if rx >= self.roi_w || ry >= self.roi_h {
            return None;
        }
        let (dx, dy) = self.roi_to_display(rx, ry);
        self.display_to_sensor(dx, dy)
    }

    /// Whether display `(dx, dy)` lies inside the ROI.
    pub fn contains_display(&self, dx: usize, dy: usize) -> bool {
        dx >= self.roi_x
            && dy >= self.roi_y
            && dx < self.roi_x + self.roi_w
            && dy < self.roi_y + self.roi_h
    }
}
