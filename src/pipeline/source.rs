//! Frame acquisition seam.
//!
//! A [`FrameSource`] lends frames that must be handed back exactly once per
//! successful acquisition; a missed release starves the source of buffers.
//! [`FrameLease`] ties the release to scope so every exit path of a cycle,
//! including `?` on a failed stage, returns the frame.
use crate::image::io::{load_grayscale_image, GrayImageU8};
use crate::image::GrayFrame;
use log::{debug, info};
use std::mem::ManuallyDrop;
use std::path::PathBuf;

pub trait FrameSource {
    type Frame: GrayFrame;

    /// Bring the source up. Failure here is fatal for the process.
    fn init(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn acquire(&mut self) -> Option<Self::Frame>;

    fn release(&mut self, frame: Self::Frame);
}

/// A frame on loan from `source`, released on drop.
pub struct FrameLease<'s, F: FrameSource> {
    source: &'s mut F,
    frame: ManuallyDrop<F::Frame>,
}

impl<'s, F: FrameSource> FrameLease<'s, F> {
    /// `None` when the source has no frame available.
    pub fn acquire(source: &'s mut F) -> Option<Self> {
        let frame = source.acquire()?;
        Some(Self {
            source,
            frame: ManuallyDrop::new(frame),
        })
    }

    pub fn frame(&self) -> &F::Frame {
        &self.frame
    }
}

impl<'s, F: FrameSource> Drop for FrameLease<'s, F> {
    fn drop(&mut self) {
        // SAFETY: `frame` is taken only here and never touched afterwards.
        let frame = unsafe { ManuallyDrop::take(&mut self.frame) };
        self.source.release(frame);
    }
}

/// Cycles through still images loaded from disk.
///
/// Models a driver with a fixed number of frame buffers: at most
/// `buffers` frames may be outstanding, after which `acquire` returns
/// `None` until one is released.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    frames: Vec<GrayImageU8>,
    next: usize,
    buffers: usize,
    outstanding: usize,
}

impl ImageSequenceSource {
    pub fn new(paths: Vec<PathBuf>, buffers: usize) -> Self {
        Self {
            paths,
            frames: Vec::new(),
            next: 0,
            buffers: buffers.max(1),
            outstanding: 0,
        }
    }

    /// Serve already-decoded frames.
    pub fn from_frames(frames: Vec<GrayImageU8>, buffers: usize) -> Self {
        Self {
            paths: Vec::new(),
            frames,
            next: 0,
            buffers: buffers.max(1),
            outstanding: 0,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

impl FrameSource for ImageSequenceSource {
    type Frame = GrayImageU8;

    fn init(&mut self) -> Result<(), String> {
        for path in &self.paths {
            self.frames.push(load_grayscale_image(path)?);
        }
        if self.frames.is_empty() {
            return Err("no input frames configured".to_string());
        }
        info!("frame source ready with {} frame(s)", self.frames.len());
        Ok(())
    }

    fn acquire(&mut self) -> Option<GrayImageU8> {
        if self.frames.is_empty() || self.outstanding >= self.buffers {
            debug!(
                "acquire refused: frames={} outstanding={}/{}",
                self.frames.len(),
                self.outstanding,
                self.buffers
            );
            return None;
        }
        let frame = self.frames[self.next].clone();
        self.next = (self.next + 1) % self.frames.len();
        self.outstanding += 1;
        Some(frame)
    }

    fn release(&mut self, _frame: GrayImageU8) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }
}
