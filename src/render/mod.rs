//! Display output: the renderer seam and the three views.
//!
//! The core only calls [`Renderer`] primitives during the render step of a
//! cycle, choosing the view from the current [`DisplayMode`]:
//!
//! - INFO: statistics and a large count box.
//! - CAMERA: the frame pixel by pixel through the rotated/cropped display
//!   mapping, plus the ROI outline.
//! - MASK: ROI mask pixels, the ROI outline and a status strip.

mod canvas;

pub use canvas::CanvasRenderer;

use crate::image::ImageU8;
use crate::pipeline::CycleOutput;
use crate::roi::RoiGeometry;
use crate::types::DisplayMode;

/// 16-bit RGB565 colour, the native format of small SPI panels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub u16);

impl Color {
    pub const BLACK: Color = Color(0x0000);
    pub const WHITE: Color = Color(0xFFFF);
    pub const RED: Color = Color(0xF800);
    pub const GREEN: Color = Color(0x07E0);
    pub const BLUE: Color = Color(0x001F);
    pub const YELLOW: Color = Color(0xFFE0);
    pub const DARK_GREY: Color = Color(0x4208);

    /// Pack 8-bit RGB.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color((((r as u16) & 0xF8) << 8) | (((g as u16) & 0xFC) << 3) | ((b as u16) >> 3))
    }

    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    /// Expand to 8-bit RGB (low bits replicated).
    pub fn to_rgb8(self) -> [u8; 3] {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
    }
}

pub trait Renderer {
    /// Panel size in pixels.
    fn size(&self) -> (usize, usize);
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color);
    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color);
    fn set_pixel(&mut self, x: i32, y: i32, color: Color);
    /// Print `text` with its top-left corner at `(x, y)`; `size` scales the
    /// base 6×8 glyph cell.
    fn print(&mut self, x: i32, y: i32, size: u8, color: Color, text: &str);
    /// Push the finished view to the panel.
    fn present(&mut self) {}
}

const LINE_HEIGHT: i32 = 8;

/// Draw the view selected by `mode` for one processed cycle.
pub fn render_cycle<R: Renderer + ?Sized>(
    renderer: &mut R,
    mode: DisplayMode,
    frame: &ImageU8,
    output: &CycleOutput,
) {
    match mode {
        DisplayMode::Info => render_info(renderer, output),
        DisplayMode::Camera => render_camera(renderer, frame, &output.geometry),
        DisplayMode::Mask => render_mask(renderer, output),
    }
    renderer.present();
}

pub fn render_info<R: Renderer + ?Sized>(renderer: &mut R, output: &CycleOutput) {
    let report = &output.report;
    let (w, _) = renderer.size();
    renderer.clear(Color::BLACK);
    renderer.print(8, 8, 2, Color::WHITE, "PARTS");

    let box_w = (w as u32).saturating_sub(16);
    renderer.fill_rect(8, 32, box_w, 80, Color::DARK_GREY);
    renderer.draw_rect(8, 32, box_w, 80, Color::GREEN);
    renderer.print(24, 48, 6, Color::YELLOW, &report.count().to_string());

    let s = &report.settings;
    let lines = [
        format!("mean {}  thr {}", report.mean, report.threshold),
        format!("offset {}", s.threshold_offset),
        format!("area {}..{}", s.min_area, s.max_area),
        format!(
            "roi {}x{} @ {},{}",
            report.roi.width, report.roi.height, report.roi.x, report.roi.y
        ),
        format!("mode {}", report.mode),
    ];
    for (i, line) in lines.iter().enumerate() {
        let y = 128 + i as i32 * (LINE_HEIGHT + 4);
        renderer.print(8, y, 1, Color::WHITE, line);
    }
    if report.counts.is_saturated() {
        let y = 128 + lines.len() as i32 * (LINE_HEIGHT + 4);
        renderer.print(8, y, 1, Color::RED, "label space full");
    }
}

pub fn render_camera<R: Renderer + ?Sized>(
    renderer: &mut R,
    frame: &ImageU8,
    geometry: &RoiGeometry,
) {
    let (w, h) = renderer.size();
    for dy in 0..h {
        for dx in 0..w {
            let color = match geometry.display_to_sensor(dx, dy) {
                Some((sx, sy)) => Color::gray(frame.get(sx, sy)),
                None => Color::BLACK,
            };
            renderer.set_pixel(dx as i32, dy as i32, color);
        }
    }
    roi_outline(renderer, geometry);
}

pub fn render_mask<R: Renderer + ?Sized>(renderer: &mut R, output: &CycleOutput) {
    let geometry = &output.geometry;
    let roi_mask = &output.roi_mask;
    let (w, h) = renderer.size();
    renderer.clear(Color::BLACK);
    for ry in 0..roi_mask.h {
        for rx in 0..roi_mask.w {
            if roi_mask.is_foreground(rx, ry) {
                let (dx, dy) = geometry.roi_to_display(rx, ry);
                renderer.set_pixel(dx as i32, dy as i32, Color::WHITE);
            }
        }
    }
    roi_outline(renderer, geometry);

    let strip_h = LINE_HEIGHT as u32 + 4;
    let strip_y = h as i32 - strip_h as i32;
    renderer.fill_rect(0, strip_y, w as u32, strip_h, Color::BLUE);
    let report = &output.report;
    renderer.print(
        2,
        strip_y + 2,
        1,
        Color::WHITE,
        &format!("n={} thr={} mean={}", report.count(), report.threshold, report.mean),
    );
}

/// Full-screen failure state for a dead frame source.
pub fn render_failure<R: Renderer + ?Sized>(renderer: &mut R, message: &str) {
    renderer.clear(Color::RED);
    renderer.print(8, 8, 2, Color::WHITE, "CAMERA FAIL");
    renderer.print(8, 32, 1, Color::WHITE, message);
    renderer.present();
}

fn roi_outline<R: Renderer + ?Sized>(renderer: &mut R, geometry: &RoiGeometry) {
    renderer.draw_rect(
        geometry.roi_x as i32,
        geometry.roi_y as i32,
        geometry.roi_w as u32,
        geometry.roi_h as u32,
        Color::GREEN,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb565_packing_round_trips_extremes() {
        assert_eq!(Color::rgb(255, 255, 255), Color::WHITE);
        assert_eq!(Color::rgb(255, 0, 0), Color::RED);
        assert_eq!(Color::gray(0), Color::BLACK);
        assert_eq!(Color::WHITE.to_rgb8(), [255, 255, 255]);
        assert_eq!(Color::GREEN.to_rgb8(), [0, 255, 0]);
    }
}
