//! Bitmaps
//!
//! `SourceBitmap` is what a frame source hands out: its pixels live in a buffer the
//! source owns and recycles. `SoftwareBitmap` is an independent, immutable copy.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Pixel format of a bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitmapPixelFormat {
    Bgra8,
    Rgba8,
    Gray8,
    Gray16,
    /// 4:2:0 planar Y + interleaved UV
    Nv12,
}

impl BitmapPixelFormat {
    /// Expected payload size in bytes for a `width` x `height` image
    pub fn buffer_len(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            BitmapPixelFormat::Bgra8 | BitmapPixelFormat::Rgba8 => pixels * 4,
            BitmapPixelFormat::Gray8 => pixels,
            BitmapPixelFormat::Gray16 => pixels * 2,
            BitmapPixelFormat::Nv12 => pixels + pixels / 2,
        }
    }
}

/// Pixel storage owned by a frame source.
///
/// Sources keep a bounded pool of these and overwrite the oldest one once the
/// pool is exhausted, so holders must copy the contents they want to keep.
#[derive(Debug, Clone, Default)]
pub struct SharedPixelBuffer(Arc<RwLock<Vec<u8>>>);

impl SharedPixelBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self(Arc::new(RwLock::new(data)))
    }

    /// Replace the contents in place (buffer recycling)
    pub fn overwrite(&self, data: &[u8]) {
        let mut guard = self.0.write();
        guard.clear();
        guard.extend_from_slice(data);
    }

    /// Mutate the contents in place
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
        f(&mut self.0.write())
    }

    /// Snapshot of the current contents
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.0.read())
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles refer to the same storage
    pub fn ptr_eq(&self, other: &SharedPixelBuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Bitmap as delivered by the frame source (aliases source storage)
#[derive(Debug, Clone)]
pub struct SourceBitmap {
    pub pixel_format: BitmapPixelFormat,
    /// Reported width in pixels
    pub pixel_width: u32,
    /// Reported height in pixels
    pub pixel_height: u32,
    pub buffer: SharedPixelBuffer,
}

/// Independently owned, immutable bitmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareBitmap {
    pixel_format: BitmapPixelFormat,
    pixel_width: u32,
    pixel_height: u32,
    data: Bytes,
}

impl SoftwareBitmap {
    pub fn new(
        pixel_format: BitmapPixelFormat,
        pixel_width: u32,
        pixel_height: u32,
        data: Bytes,
    ) -> Self {
        Self {
            pixel_format,
            pixel_width,
            pixel_height,
            data,
        }
    }

    /// Deep copy of a source bitmap. The result never shares storage with `source`.
    pub fn copy_from(source: &SourceBitmap) -> Self {
        Self {
            pixel_format: source.pixel_format,
            pixel_width: source.pixel_width,
            pixel_height: source.pixel_height,
            data: source.buffer.snapshot(),
        }
    }

    pub fn pixel_format(&self) -> BitmapPixelFormat {
        self.pixel_format
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
