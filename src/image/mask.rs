//! Owned binary raster in row-major layout (stride == width).
//!
//! Pixels are either [`FOREGROUND`] or [`BACKGROUND`]. Buffers are obtained
//! fallibly so an exhausted allocator surfaces as
//! [`PipelineError::AllocationFailed`] instead of aborting the process.
use crate::error::{PipelineError, Stage};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskU8 {
    /// Mask width in pixels
    pub w: usize,
    /// Mask height in pixels
    pub h: usize,
    /// Bytes between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<u8>,
}

impl MaskU8 {
    /// Allocate an all-background mask of size `w × h`, reporting failure
    /// against `stage`.
    pub fn try_new(w: usize, h: usize, stage: Stage) -> Result<Self, PipelineError> {
        let data = try_zeroed(w * h, stage)?;
        Ok(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }
    #[inline]
    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        self.get(x, y) != BACKGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != BACKGROUND).count()
    }
}

impl crate::image::traits::ImageView for MaskU8 {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

/// Fallibly allocate `len` zeroed elements.
pub(crate) fn try_zeroed<T: Copy + Default>(
    len: usize,
    stage: Stage,
) -> Result<Vec<T>, PipelineError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| PipelineError::AllocationFailed {
            stage,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buf.resize(len, T::default());
    Ok(buf)
}
