//! SensorFrameSink trait - ingestion output interface

use std::sync::Arc;

use crate::SensorFrame;

/// Push interface receiving each completed [`SensorFrame`].
///
/// `send` is called synchronously on the frame source's callback thread, before
/// the frame becomes visible through the latest-frame cache. There is no timeout,
/// retry or backpressure on the calling side: a slow sink stalls ingestion for
/// that sensor, so implementations should hand off quickly. Implementations must
/// not call back into the context that is delivering to them.
pub trait SensorFrameSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver a frame
    fn send(&self, frame: Arc<SensorFrame>);
}
