//! # Frame Ingestion
//!
//! Sensor frame ingestion module.
//!
//! Responsibilities:
//! - Handle frame arrival notifications of a frame source
//! - Convert device-relative timestamps into absolute time
//! - Copy pixels out of recycled source buffers
//! - Extract pose metadata (frame-to-origin, camera view, intrinsics)
//! - Deliver each `SensorFrame` to the sink, then publish it as the latest frame
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use contracts::{FrameSource, SensorType, UniversalTime};
//! use ingestion::{MediaFrameReaderContext, MockFrameSource, MockSpatialPerception, TimeConverter};
//!
//! let source = MockFrameSource::with_defaults(SensorType::PhotoVideo);
//! let perception = Arc::new(MockSpatialPerception::new());
//! let converter = TimeConverter::from_reference(source.relative_now(), UniversalTime::now());
//!
//! let context = Arc::new(MediaFrameReaderContext::new(
//!     SensorType::PhotoVideo,
//!     perception.clone(),
//!     perception,
//!     Some(sink),
//!     converter,
//! ));
//! source.listen(context.arrival_callback());
//!
//! if let Some(frame) = context.latest_sensor_frame() {
//!     // ...
//! }
//! ```

mod error;
mod latest_frame;
mod metadata;
mod mock;
mod reader_context;
mod stats;
mod time_converter;

// Re-exports
pub use error::{ArrivalError, ArrivalErrorKind, Result};
pub use latest_frame::LatestFrameCache;
pub use metadata::{
    FrameMetadata, FrameMetadataKey, CAMERA_COORDINATE_SYSTEM, CAMERA_VIEW_TRANSFORM,
    SENSOR_STREAMING_CAMERA_INTRINSICS,
};
pub use mock::{
    MockCoordinateSystem, MockFrame, MockFrameReader, MockFrameSource, MockFrameSourceConfig,
    MockSpatialPerception,
};
pub use reader_context::MediaFrameReaderContext;
pub use stats::{ContextStats, ContextStatsSnapshot};
pub use time_converter::TimeConverter;
