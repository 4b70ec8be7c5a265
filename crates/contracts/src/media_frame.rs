//! MediaFrameReference - frame source output
//!
//! What a frame source hands out on `try_acquire_latest_frame`: a relative
//! timestamp, an optional decoded video payload and a property bag of sample
//! metadata keyed by GUID.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use crate::{CameraProjection, HundredsOfNanoseconds, SourceBitmap, SpatialCoordinateSystem};

/// Typed value stored in a frame's property bag
#[derive(Clone)]
pub enum PropertyValue {
    /// Coordinate system the frame was captured in
    CoordinateSystem(Arc<dyn SpatialCoordinateSystem>),
    /// Raw byte blob
    Bytes(Bytes),
    /// Camera intrinsics handle
    CameraIntrinsics(Arc<dyn CameraProjection>),
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::CoordinateSystem(cs) => {
                f.debug_tuple("CoordinateSystem").field(&cs.id()).finish()
            }
            PropertyValue::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            PropertyValue::CameraIntrinsics(_) => f.write_str("CameraIntrinsics(..)"),
        }
    }
}

/// Sample metadata attached to a frame
#[derive(Debug, Clone, Default)]
pub struct FrameProperties(HashMap<Uuid, PropertyValue>);

impl FrameProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Uuid, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(key, value)
    }

    /// Builder-style insert
    pub fn with(mut self, key: Uuid, value: PropertyValue) -> Self {
        self.0.insert(key, value);
        self
    }

    pub fn lookup(&self, key: &Uuid) -> Option<&PropertyValue> {
        self.0.get(key)
    }
}

/// Decoded video payload of a frame
#[derive(Debug, Clone, Default)]
pub struct VideoMediaFrame {
    /// Decoded pixels; absent when the source only produced a GPU surface
    pub software_bitmap: Option<SourceBitmap>,
}

/// A frame acquired from a frame source
#[derive(Debug, Clone)]
pub struct MediaFrameReference {
    /// Exposure time relative to the device clock
    pub system_relative_time: HundredsOfNanoseconds,

    /// Video payload, absent for non-video frames
    pub video_media_frame: Option<VideoMediaFrame>,

    /// Sample metadata
    pub properties: FrameProperties,
}

/// Pull interface of a frame source
pub trait MediaFrameReader: Send + Sync {
    /// Newest frame that has not yet been acquired.
    ///
    /// Returns `None` when no such frame exists or the reader is not started
    /// (an arrival notification may still be in flight after a stop).
    fn try_acquire_latest_frame(&self) -> Option<MediaFrameReference>;
}
