//! Frame buffers and the seams to the external video source and sink.
//!
//! Frames are interleaved 8-bit pixel buffers (`height * width * channels`
//! bytes, row-major). Decoding and encoding happen outside this workspace;
//! the stabilizer only reads frames by index and emits new buffers.

use crate::error::ModelError;

/// Dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl FrameSize {
    /// Number of bytes a frame of this size occupies.
    pub fn byte_len(&self) -> usize {
        self.width * self.height * self.channels
    }

    /// Centre of the pixel grid, where pixel `(0, 0)` is at the origin and
    /// pixel `(width - 1, height - 1)` at the far corner.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.width as f64 - 1.0) / 2.0,
            (self.height as f64 - 1.0) / 2.0,
        )
    }
}

/// An owned pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    size: FrameSize,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap an interleaved buffer, checking its length against the size.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, ModelError> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(ModelError::invalid_frame(format!(
                "dimensions must be non-zero, got {width}x{height}x{channels}"
            )));
        }
        let size = FrameSize {
            width,
            height,
            channels,
        };
        if data.len() != size.byte_len() {
            return Err(ModelError::invalid_frame(format!(
                "expected {} bytes for {width}x{height}x{channels}, got {}",
                size.byte_len(),
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    /// A frame with every byte set to `value`.
    pub fn filled(size: FrameSize, value: u8) -> Self {
        Self {
            size,
            data: vec![value; size.byte_len()],
        }
    }

    /// Build a frame from a per-pixel function returning one byte per channel.
    pub fn from_fn(size: FrameSize, mut f: impl FnMut(usize, usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(size.byte_len());
        for y in 0..size.height {
            for x in 0..size.width {
                for c in 0..size.channels {
                    data.push(f(x, y, c));
                }
            }
        }
        Self { size, data }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    pub fn channels(&self) -> usize {
        self.size.channels
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Channel values of the pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let base = (y * self.size.width + x) * self.size.channels;
        Some(&self.data[base..base + self.size.channels])
    }

    /// Bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.size.height {
            return None;
        }
        let stride = self.size.width * self.size.channels;
        Some(&self.data[y * stride..(y + 1) * stride])
    }

    /// Mean intensity over all channels, in `[0, 255]`.
    pub fn mean_intensity(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
    }
}

/// An ordered, index-addressable sequence of decoded frames.
///
/// Implementations are owned by the decoder; the stabilizer only borrows.
pub trait FrameSource: Sync {
    /// Number of frames available.
    fn frame_count(&self) -> usize;

    /// The frame at `index`, or `None` when it cannot be read.
    fn frame(&self, index: usize) -> Option<&Frame>;
}

impl FrameSource for [Frame] {
    fn frame_count(&self) -> usize {
        self.len()
    }

    fn frame(&self, index: usize) -> Option<&Frame> {
        self.get(index)
    }
}

impl FrameSource for Vec<Frame> {
    fn frame_count(&self) -> usize {
        self.len()
    }

    fn frame(&self, index: usize) -> Option<&Frame> {
        self.get(index)
    }
}

/// Receives stabilized frames in original frame order.
pub trait FrameSink {
    type Error: std::fmt::Display;

    fn emit(&mut self, index: usize, frame: Frame) -> Result<(), Self::Error>;
}

impl FrameSink for Vec<Frame> {
    type Error = std::convert::Infallible;

    fn emit(&mut self, _index: usize, frame: Frame) -> Result<(), Self::Error> {
        self.push(frame);
        Ok(())
    }
}
