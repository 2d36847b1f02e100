use super::{Color, Renderer};
use crate::image::io::ensure_parent_dir;
use image::{Rgb, RgbImage};
use std::path::Path;

/// Off-screen renderer backed by an RGB image.
///
/// There is no font: each printed glyph is drawn as a solid cell and the
/// text itself is kept in [`CanvasRenderer::texts`] so callers can inspect
/// what a view would have said.
pub struct CanvasRenderer {
    img: RgbImage,
    texts: Vec<(i32, i32, String)>,
    presented: u64,
}

const GLYPH_W: i32 = 6;
const GLYPH_H: i32 = 8;

impl CanvasRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbImage::new(width, height),
            texts: Vec::new(),
            presented: 0,
        }
    }

    /// Text printed since the last `clear`.
    pub fn texts(&self) -> &[(i32, i32, String)] {
        &self.texts
    }

    /// Number of finished views pushed so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Colour at `(x, y)`, reduced back to RGB565. `None` off-canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.img.width() || y >= self.img.height() {
            return None;
        }
        let [r, g, b] = self.img.get_pixel(x, y).0;
        Some(Color::rgb(r, g, b))
    }

    pub fn image(&self) -> &RgbImage {
        &self.img
    }

    pub fn save_png(&self, path: &Path) -> Result<(), String> {
        ensure_parent_dir(path)?;
        self.img
            .save(path)
            .map_err(|e| format!("Failed to save {}: {e}", path.display()))
    }

    fn clip(&self, x: i32, y: i32, w: u32, h: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + w as i64).min(self.img.width() as i64);
        let y1 = (y as i64 + h as i64).min(self.img.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

impl Renderer for CanvasRenderer {
    fn size(&self) -> (usize, usize) {
        (self.img.width() as usize, self.img.height() as usize)
    }

    fn clear(&mut self, color: Color) {
        let px = Rgb(color.to_rgb8());
        for p in self.img.pixels_mut() {
            *p = px;
        }
        self.texts.clear();
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        let px = Rgb(color.to_rgb8());
        for yy in y0..y1 {
            for xx in x0..x1 {
                self.img.put_pixel(xx, yy, px);
            }
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) {
        if w == 0 || h == 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h as i32 - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w as i32 - 1, y, 1, h, color);
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x < self.img.width() && y < self.img.height() {
            self.img.put_pixel(x, y, Rgb(color.to_rgb8()));
        }
    }

    fn print(&mut self, x: i32, y: i32, size: u8, color: Color, text: &str) {
        let scale = size.max(1) as i32;
        let (cw, ch) = (GLYPH_W * scale, GLYPH_H * scale);
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let gx = x + i as i32 * cw;
            self.fill_rect(gx, y + scale, (cw - scale) as u32, (ch - 2 * scale) as u32, color);
        }
        self.texts.push((x, y, text.to_string()));
    }

    fn present(&mut self) {
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_is_clipped_to_the_canvas() {
        let mut c = CanvasRenderer::new(10, 10);
        c.fill_rect(-5, -5, 8, 8, Color::WHITE);
        c.fill_rect(8, 8, 100, 100, Color::RED);
        c.set_pixel(-1, 3, Color::GREEN);
        c.set_pixel(10, 3, Color::GREEN);
        assert_eq!(c.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(c.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(c.pixel(3, 3), Some(Color::BLACK));
        assert_eq!(c.pixel(9, 9), Some(Color::RED));
        assert_eq!(c.pixel(10, 0), None);
    }

    #[test]
    fn draw_rect_only_touches_the_outline() {
        let mut c = CanvasRenderer::new(10, 10);
        c.draw_rect(2, 2, 5, 5, Color::GREEN);
        assert_eq!(c.pixel(2, 2), Some(Color::GREEN));
        assert_eq!(c.pixel(6, 6), Some(Color::GREEN));
        assert_eq!(c.pixel(4, 4), Some(Color::BLACK));
    }

    #[test]
    fn clear_forgets_printed_text() {
        let mut c = CanvasRenderer::new(64, 16);
        c.print(0, 0, 1, Color::WHITE, "42");
        assert_eq!(c.texts(), &[(0, 0, "42".to_string())]);
        c.clear(Color::BLUE);
        assert!(c.texts().is_empty());
        assert_eq!(c.pixel(0, 0), Some(Color::BLUE));
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/view.png");
        let mut c = CanvasRenderer::new(8, 8);
        c.clear(Color::YELLOW);
        c.save_png(&path).unwrap();
        assert!(path.exists());
    }
}
