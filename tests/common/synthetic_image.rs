/// Uniform `background` frame with solid black rectangles `(x, y, w, h)`.
pub fn frame_with_parts(
    width: usize,
    height: usize,
    background: u8,
    parts: &[(usize, usize, usize, usize)],
) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let mut img = vec![background; width * height];
    for &(x0, y0, w, h) in parts {
        assert!(x0 + w <= width && y0 + h <= height, "part must fit the frame");
        for y in y0..y0 + h {
            img[y * width + x0..y * width + x0 + w].fill(0);
        }
    }
    img
}

/// Regular grid of `size`×`size` black squares spaced `pitch` apart.
#[allow(dead_code)]
pub fn part_grid(
    width: usize,
    height: usize,
    background: u8,
    size: usize,
    pitch: usize,
) -> Vec<u8> {
    assert!(size > 0 && pitch > size, "pitch must leave a gap between parts");
    let mut parts = Vec::new();
    let mut y = pitch - size;
    while y + size <= height {
        let mut x = pitch - size;
        while x + size <= width {
            parts.push((x, y, size, size));
            x += pitch;
        }
        y += pitch;
    }
    frame_with_parts(width, height, background, &parts)
}
