//! FrameSource trait - push-side abstraction of a frame source
//!
//! Real device sources (enumeration, start/stop of hardware streams) live outside
//! this workspace; the trait lets mock and real sources drive ingestion the same way.

use std::sync::Arc;

use crate::{MediaFrameReader, SensorType};

/// Arrival notification callback.
///
/// The source invokes it on its own thread with a reader the callback pulls the
/// newest frame from.
pub type FrameArrivedCallback = Arc<dyn Fn(&dyn MediaFrameReader) + Send + Sync>;

/// Frame source trait
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn FrameSource> = open_source(SensorType::PhotoVideo);
/// source.listen(context.arrival_callback());
/// // ... frames flow ...
/// source.stop();
/// ```
pub trait FrameSource: Send + Sync {
    /// Sensor this source produces frames for
    fn sensor_type(&self) -> SensorType;

    /// Register the arrival callback and start delivering notifications.
    ///
    /// Repeated calls while listening are ignored.
    fn listen(&self, callback: FrameArrivedCallback);

    /// Stop delivering notifications
    fn stop(&self);

    fn is_listening(&self) -> bool;
}
