//! LogSink - logs frame summary via tracing

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use contracts::{SensorFrame, SensorFrameSink};
use tracing::info;

use crate::metrics::SinkMetrics;

/// Sink that logs frame summaries for debugging
pub struct LogSink {
    name: String,
    metrics: Arc<SinkMetrics>,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            metrics: Arc::new(SinkMetrics::new(name.clone())),
            name,
        }
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    fn log_frame_summary(&self, frame: &SensorFrame) {
        let captured_at = captured_at(frame);
        let image = frame.image();

        info!(
            sink = %self.name,
            sensor_type = %frame.sensor_type(),
            timestamp = frame.timestamp().ticks(),
            captured_at = captured_at.as_deref().unwrap_or("out_of_range"),
            width = image.pixel_width(),
            height = image.pixel_height(),
            pixel_format = ?image.pixel_format(),
            has_pose = frame.has_frame_to_origin(),
            has_view = frame.has_camera_view_transform(),
            has_intrinsics = frame.camera_intrinsics().is_some(),
            "SensorFrame received"
        );
    }
}

/// RFC 3339 wall-clock time of the frame, if its ticks map to a calendar time
fn captured_at(frame: &SensorFrame) -> Option<String> {
    let time: DateTime<Utc> = frame.timestamp().to_system_time()?.into();
    Some(time.to_rfc3339_opts(SecondsFormat::Micros, true))
}

impl SensorFrameSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, frame: Arc<SensorFrame>) {
        self.log_frame_summary(&frame);
        self.metrics.record_delivered();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::test_support::gray_frame;
    use contracts::SensorType;

    #[test]
    fn test_log_sink_send() {
        let sink = LogSink::new("test_log");
        sink.send(gray_frame(SensorType::PhotoVideo, 1));
        sink.send(gray_frame(SensorType::PhotoVideo, 2));
        assert_eq!(sink.metrics().delivered(), 2);
    }

    #[test]
    fn test_log_sink_handles_extreme_timestamps() {
        let sink = LogSink::new("test_log");
        sink.send(gray_frame(SensorType::PhotoVideo, i64::MIN));
        sink.send(gray_frame(SensorType::PhotoVideo, i64::MAX));
        assert_eq!(sink.metrics().delivered(), 2);
    }

    #[test]
    fn test_captured_at_format() {
        let frame = gray_frame(SensorType::PhotoVideo, contracts::UNIX_EPOCH_TICKS + 15);
        assert_eq!(
            captured_at(&frame).as_deref(),
            Some("1970-01-01T00:00:00.000001Z")
        );
        assert_eq!(captured_at(&gray_frame(SensorType::PhotoVideo, i64::MIN)), None);
    }

    #[test]
    fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
