//! Frame arrival handling for one sensor stream

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    CameraIntrinsics, Float4x4, FrameArrivedCallback, MediaFrameReader, OriginFrameProvider,
    PerceptionTimestampResolver, SensorFrame, SensorFrameSink, SensorType, SoftwareBitmap,
};
use tracing::{debug, error, trace, warn};

use crate::error::{ArrivalError, ArrivalErrorKind, Result};
use crate::latest_frame::LatestFrameCache;
use crate::metadata::FrameMetadata;
use crate::stats::{ContextStats, ContextStatsSnapshot};
use crate::time_converter::TimeConverter;

/// Turns arrival notifications of one frame reader into [`SensorFrame`]s.
///
/// Each accepted frame is pushed to the optional sink and then becomes the
/// context's latest frame. `frame_arrived` runs on the source's callback
/// thread and never propagates a failure back into it.
pub struct MediaFrameReaderContext {
    sensor_type: SensorType,
    timestamp_resolver: Arc<dyn PerceptionTimestampResolver>,
    origin_provider: Arc<dyn OriginFrameProvider>,
    sink: Option<Arc<dyn SensorFrameSink>>,
    time_converter: TimeConverter,
    latest: LatestFrameCache,
    stats: ContextStats,
}

impl MediaFrameReaderContext {
    pub fn new(
        sensor_type: SensorType,
        timestamp_resolver: Arc<dyn PerceptionTimestampResolver>,
        origin_provider: Arc<dyn OriginFrameProvider>,
        sink: Option<Arc<dyn SensorFrameSink>>,
        time_converter: TimeConverter,
    ) -> Self {
        Self {
            sensor_type,
            timestamp_resolver,
            origin_provider,
            sink,
            time_converter,
            latest: LatestFrameCache::new(),
            stats: ContextStats::new(),
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn time_converter(&self) -> &TimeConverter {
        &self.time_converter
    }

    /// Most recent frame produced by this context
    pub fn latest_sensor_frame(&self) -> Option<Arc<SensorFrame>> {
        self.latest.get()
    }

    pub fn stats(&self) -> ContextStatsSnapshot {
        self.stats.snapshot()
    }

    /// Callback to register with a [`contracts::FrameSource`]
    pub fn arrival_callback(self: &Arc<Self>) -> FrameArrivedCallback {
        let context = Arc::clone(self);
        Arc::new(move |reader: &dyn MediaFrameReader| context.frame_arrived(reader))
    }

    /// Handle one arrival notification
    pub fn frame_arrived(&self, reader: &dyn MediaFrameReader) {
        self.stats.record_arrival();
        observability::record_frame_arrived(self.sensor_type);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process_arrival(reader)))
            .unwrap_or_else(|payload| {
                Err(ArrivalError::CollaboratorPanicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        match outcome {
            Ok(frame) => {
                self.stats.record_produced(frame.has_frame_to_origin());
                observability::record_frame_produced(&frame);
            }
            Err(err) => self.report_skip(&err),
        }
    }

    fn process_arrival(&self, reader: &dyn MediaFrameReader) -> Result<Arc<SensorFrame>> {
        let frame = reader
            .try_acquire_latest_frame()
            .ok_or(ArrivalError::FrameNotAvailable)?;
        let video = frame
            .video_media_frame
            .as_ref()
            .ok_or(ArrivalError::MissingVideoMediaFrame)?;
        let source_bitmap = video
            .software_bitmap
            .as_ref()
            .ok_or(ArrivalError::MissingSoftwareBitmap)?;

        trace!(
            sensor_type = %self.sensor_type,
            relative_ticks = frame.system_relative_time.count(),
            "frame acquired"
        );

        let timestamp = self
            .time_converter
            .relative_ticks_to_absolute_ticks(frame.system_relative_time);

        // Pose context at exposure time is required; without it the frame is dropped.
        let perception_timestamp = self
            .timestamp_resolver
            .from_historical_target_time(timestamp)
            .map_err(|source| ArrivalError::TimestampResolution { source })?;
        trace!(
            sensor_type = %self.sensor_type,
            target_ticks = perception_timestamp.target_time().ticks(),
            "perception timestamp resolved"
        );

        // The source recycles its buffers once enough newer frames were acquired.
        let image = SoftwareBitmap::copy_from(source_bitmap);

        let metadata = FrameMetadata::extract(&frame.properties);
        let frame_to_origin = self.resolve_frame_to_origin(&metadata);
        let camera_view_transform = metadata.camera_view_transform();
        if let Some(view) = &camera_view_transform {
            trace!(sensor_type = %self.sensor_type, camera_view_transform = ?view, "camera view transform");
        }

        let camera_intrinsics = metadata.camera_intrinsics().map(|projection| {
            CameraIntrinsics::new(
                Arc::clone(projection),
                self.effective_image_width(source_bitmap.pixel_width),
                source_bitmap.pixel_height,
            )
        });

        let sensor_frame = Arc::new(
            SensorFrame::builder(self.sensor_type, timestamp, image)
                .frame_to_origin(frame_to_origin)
                .camera_view_transform(camera_view_transform)
                .camera_intrinsics(camera_intrinsics)
                .build(),
        );

        if let Some(sink) = &self.sink {
            let started = Instant::now();
            sink.send(Arc::clone(&sensor_frame));
            observability::record_sink_delivery_ms(
                sink.name(),
                started.elapsed().as_secs_f64() * 1000.0,
            );
        }

        self.latest.set(Arc::clone(&sensor_frame));

        Ok(sensor_frame)
    }

    fn resolve_frame_to_origin(&self, metadata: &FrameMetadata) -> Option<Float4x4> {
        metadata.coordinate_system()?;

        let origin = self.origin_provider.origin_coordinate_system();
        let frame_to_origin = metadata.frame_to_origin(origin.as_ref());
        match &frame_to_origin {
            Some(transform) => {
                trace!(sensor_type = %self.sensor_type, frame_to_origin = ?transform, "frame-to-origin resolved");
            }
            None => {
                debug!(sensor_type = %self.sensor_type, "frame coordinate system not relatable to origin");
            }
        }
        frame_to_origin
    }

    fn effective_image_width(&self, reported_width: u32) -> u32 {
        reported_width.saturating_mul(self.sensor_type.width_unpack_factor())
    }

    fn report_skip(&self, err: &ArrivalError) {
        let kind = err.kind();
        self.stats.record_skipped(kind);
        observability::record_frame_skipped(self.sensor_type, kind.as_str());

        match kind {
            ArrivalErrorKind::NotAvailable => {
                trace!(sensor_type = %self.sensor_type, "{err}");
            }
            ArrivalErrorKind::MissingData => {
                debug!(sensor_type = %self.sensor_type, "frame skipped: {err}");
            }
            ArrivalErrorKind::TimestampResolutionFailure => {
                warn!(sensor_type = %self.sensor_type, error = %err, "frame dropped");
            }
            ArrivalErrorKind::Panicked => {
                error!(sensor_type = %self.sensor_type, error = %err, "frame dropped");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        CAMERA_COORDINATE_SYSTEM, CAMERA_VIEW_TRANSFORM, SENSOR_STREAMING_CAMERA_INTRINSICS,
    };
    use crate::mock::{MockFrame, MockFrameReader, MockSpatialPerception};
    use bytes::Bytes;
    use contracts::{
        BitmapPixelFormat, FrameProperties, HundredsOfNanoseconds, MediaFrameReference,
        PinholeProjection, PropertyValue, UniversalTime, VideoMediaFrame,
    };
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<Arc<SensorFrame>>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.frames.lock().len()
        }
    }

    impl SensorFrameSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn send(&self, frame: Arc<SensorFrame>) {
            self.frames.lock().push(frame);
        }
    }

    struct PanickingSink;

    impl SensorFrameSink for PanickingSink {
        fn name(&self) -> &str {
            "panicking"
        }

        fn send(&self, _frame: Arc<SensorFrame>) {
            panic!("sink exploded");
        }
    }

    /// Reader handing out a fixed frame once
    struct OneShotReader(Mutex<Option<MediaFrameReference>>);

    impl OneShotReader {
        fn new(frame: MediaFrameReference) -> Self {
            Self(Mutex::new(Some(frame)))
        }
    }

    impl MediaFrameReader for OneShotReader {
        fn try_acquire_latest_frame(&self) -> Option<MediaFrameReference> {
            self.0.lock().take()
        }
    }

    const OFFSET: i64 = 1_000_000;

    fn context(
        sensor_type: SensorType,
        perception: &Arc<MockSpatialPerception>,
        sink: Option<Arc<dyn SensorFrameSink>>,
    ) -> MediaFrameReaderContext {
        MediaFrameReaderContext::new(
            sensor_type,
            perception.clone(),
            perception.clone(),
            sink,
            TimeConverter::with_offset(HundredsOfNanoseconds(OFFSET)),
        )
    }

    fn gray_frame(ticks: i64, width: u32, height: u32) -> MockFrame {
        MockFrame::new(
            HundredsOfNanoseconds(ticks),
            BitmapPixelFormat::Gray8,
            width,
            height,
            vec![(ticks % 251) as u8; (width * height) as usize],
        )
    }

    #[test]
    fn test_latest_is_empty_before_any_arrival() {
        let perception = Arc::new(MockSpatialPerception::new());
        let ctx = context(SensorType::PhotoVideo, &perception, None);
        assert!(ctx.latest_sensor_frame().is_none());
    }

    #[test]
    fn test_no_frame_available_is_silent() {
        let perception = Arc::new(MockSpatialPerception::new());
        let sink = Arc::new(RecordingSink::default());
        let ctx = context(SensorType::PhotoVideo, &perception, Some(sink.clone()));
        let reader = MockFrameReader::new(4);
        reader.start();

        ctx.frame_arrived(&reader);

        assert_eq!(sink.count(), 0);
        assert!(ctx.latest_sensor_frame().is_none());
        assert_eq!(ctx.stats().not_available, 1);
    }

    #[test]
    fn test_missing_payload_leaves_state_untouched() {
        let perception = Arc::new(MockSpatialPerception::new());
        let sink = Arc::new(RecordingSink::default());
        let ctx = context(SensorType::PhotoVideo, &perception, Some(sink.clone()));

        let reader = MockFrameReader::new(4);
        reader.start();
        reader.push_frame(gray_frame(10, 2, 2));
        ctx.frame_arrived(&reader);
        let before = ctx.latest_sensor_frame().unwrap();

        let no_video = OneShotReader::new(MediaFrameReference {
            system_relative_time: HundredsOfNanoseconds(20),
            video_media_frame: None,
            properties: FrameProperties::new(),
        });
        ctx.frame_arrived(&no_video);

        let no_bitmap = OneShotReader::new(MediaFrameReference {
            system_relative_time: HundredsOfNanoseconds(30),
            video_media_frame: Some(VideoMediaFrame::default()),
            properties: FrameProperties::new(),
        });
        ctx.frame_arrived(&no_bitmap);

        assert_eq!(sink.count(), 1);
        assert!(Arc::ptr_eq(&before, &ctx.latest_sensor_frame().unwrap()));
        assert_eq!(ctx.stats().missing_data, 2);
    }

    #[test]
    fn test_timestamp_conversion_and_defaults() {
        let perception = Arc::new(MockSpatialPerception::new());
        let ctx = context(SensorType::PhotoVideo, &perception, None);
        let reader = MockFrameReader::new(4);
        reader.start();
        reader.push_frame(gray_frame(1234, 4, 2));

        ctx.frame_arrived(&reader);

        let frame = ctx.latest_sensor_frame().unwrap();
        assert_eq!(frame.sensor_type(), SensorType::PhotoVideo);
        assert_eq!(frame.timestamp(), UniversalTime(1234 + OFFSET));
        assert_eq!(frame.image().pixel_width(), 4);
        assert_eq!(frame.frame_to_origin(), Float4x4::ZERO);
        assert_eq!(frame.camera_view_transform(), Float4x4::ZERO);
        assert!(frame.camera_intrinsics().is_none());
        assert_eq!(ctx.stats().frames_without_pose, 1);
    }

    #[test]
    fn test_output_does_not_alias_recycled_source_buffer() {
        let perception = Arc::new(MockSpatialPerception::new());
        let ctx = context(SensorType::PhotoVideo, &perception, None);
        let reader = MockFrameReader::new(1);
        reader.start();

        reader.push_frame(gray_frame(1, 2, 2));
        let source_buffer = reader.buffer(0).unwrap();
        ctx.frame_arrived(&reader);
        let first = ctx.latest_sensor_frame().unwrap();

        // pool of one: the next frame recycles the same buffer
        reader.push_frame(gray_frame(2, 2, 2));
        source_buffer.with_mut(|pixels| pixels.fill(0xEE));

        assert_eq!(first.image().data().as_ref(), &[1u8; 4]);
    }

    #[test]
    fn test_frame_to_origin_resolved_through_origin() {
        let camera_to_origin = Float4x4::translation(1.0, 2.0, 3.0);
        let perception = Arc::new(MockSpatialPerception::new());
        let camera = perception.camera_coordinate_system(camera_to_origin);
        let ctx = context(SensorType::PhotoVideo, &perception, None);

        let reader = MockFrameReader::new(4);
        reader.start();
        reader.push_frame(gray_frame(5, 2, 2).with_property(
            CAMERA_COORDINATE_SYSTEM,
            PropertyValue::CoordinateSystem(camera),
        ));
        ctx.frame_arrived(&reader);

        let frame = ctx.latest_sensor_frame().unwrap();
        assert!(frame.has_frame_to_origin());
        assert_eq!(frame.frame_to_origin(), camera_to_origin);
    }

    #[test]
    fn test_unrelatable_coordinate_system_yields_sentinel() {
        let perception = Arc::new(MockSpatialPerception::new());
        let lost = perception.detached_coordinate_system();
        let ctx = context(SensorType::PhotoVideo, &perception, None);

        let reader = MockFrameReader::new(4);
        reader.start();
        reader.push_frame(
            gray_frame(5, 2, 2)
                .with_property(CAMERA_COORDINATE_SYSTEM, PropertyValue::CoordinateSystem(lost)),
        );
        ctx.frame_arrived(&reader);

        let frame = ctx.latest_sensor_frame().unwrap();
        assert!(!frame.has_frame_to_origin());
        assert_eq!(frame.frame_to_origin(), Float4x4::ZERO);
    }

    #[test]
    fn test_view_transform_bytes_reinterpreted_exactly() {
        let perception = Arc::new(MockSpatialPerception::new());
        let ctx = context(SensorType::PhotoVideo, &perception, None);
        let bytes: Vec<u8> = (0..16u32)
            .flat_map(|i| (i as f32 * 1.25 - 7.0).to_ne_bytes())
            .collect();

        let reader = MockFrameReader::new(4);
        reader.start();
        reader.push_frame(gray_frame(5, 2, 2).with_property(
            CAMERA_VIEW_TRANSFORM,
            PropertyValue::Bytes(Bytes::from(bytes.clone())),
        ));
        ctx.frame_arrived(&reader);

        let frame = ctx.latest_sensor_frame().unwrap();
        assert!(frame.has_camera_view_transform());
        assert_eq!(frame.camera_view_transform().as_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_intrinsics_width_unpacked_for_tracking_cameras() {
        let perception = Arc::new(MockSpatialPerception::new());
        let pinhole = Arc::new(PinholeProjection {
            focal_length: [360.0, 360.0],
            principal_point: [320.0, 240.0],
        });

        for (sensor_type, expected_width) in [
            (SensorType::VisibleLightLeftFront, 640),
            (SensorType::VisibleLightRightRight, 640),
            (SensorType::PhotoVideo, 160),
            (SensorType::LongThrowToFDepth, 160),
        ] {
            let ctx = context(sensor_type, &perception, None);
            let reader = MockFrameReader::new(4);
            reader.start();
            reader.push_frame(gray_frame(9, 160, 480).with_property(
                SENSOR_STREAMING_CAMERA_INTRINSICS,
                PropertyValue::CameraIntrinsics(pinhole.clone()),
            ));
            ctx.frame_arrived(&reader);

            let frame = ctx.latest_sensor_frame().unwrap();
            let intrinsics = frame.camera_intrinsics().unwrap();
            assert_eq!(intrinsics.image_width(), expected_width, "{sensor_type}");
            assert_eq!(intrinsics.image_height(), 480);
            // the bitmap itself is not unpacked
            assert_eq!(frame.image().pixel_width(), 160);
        }
    }

    #[test]
    fn test_timestamp_failure_discards_frame() {
        let perception = Arc::new(MockSpatialPerception::new());
        let sink = Arc::new(RecordingSink::default());
        let ctx = context(SensorType::PhotoVideo, &perception, Some(sink.clone()));
        let reader = MockFrameReader::new(4);
        reader.start();

        perception.set_timestamp_failure(true);
        reader.push_frame(gray_frame(5, 2, 2));
        ctx.frame_arrived(&reader);

        assert_eq!(sink.count(), 0);
        assert!(ctx.latest_sensor_frame().is_none());
        assert_eq!(ctx.stats().timestamp_failures, 1);

        perception.set_timestamp_failure(false);
        reader.push_frame(gray_frame(6, 2, 2));
        ctx.frame_arrived(&reader);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_sink_and_cache_see_same_frame_in_order() {
        let perception = Arc::new(MockSpatialPerception::new());
        let sink = Arc::new(RecordingSink::default());
        let ctx = context(SensorType::ShortThrowToFDepth, &perception, Some(sink.clone()));
        let reader = MockFrameReader::new(2);
        reader.start();

        for ticks in 1..=5 {
            reader.push_frame(gray_frame(ticks, 2, 2));
            ctx.frame_arrived(&reader);
        }

        let delivered = sink.frames.lock();
        assert_eq!(delivered.len(), 5);
        let latest = ctx.latest_sensor_frame().unwrap();
        assert!(Arc::ptr_eq(&latest, &delivered[4]));
        assert_eq!(latest.timestamp(), UniversalTime(5 + OFFSET));
        assert_eq!(ctx.stats().frames_produced, 5);
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let perception = Arc::new(MockSpatialPerception::new());
        let ctx = context(
            SensorType::PhotoVideo,
            &perception,
            Some(Arc::new(PanickingSink)),
        );
        let reader = MockFrameReader::new(4);
        reader.start();
        reader.push_frame(gray_frame(5, 2, 2));

        ctx.frame_arrived(&reader);

        assert!(ctx.latest_sensor_frame().is_none());
        assert_eq!(ctx.stats().panics, 1);
    }

    #[test]
    fn test_arrival_callback_drives_context() {
        let perception = Arc::new(MockSpatialPerception::new());
        let ctx = Arc::new(context(SensorType::PhotoVideo, &perception, None));
        let callback = ctx.arrival_callback();
        let reader = MockFrameReader::new(4);
        reader.start();
        reader.push_frame(gray_frame(77, 2, 2));

        callback(&reader as &dyn MediaFrameReader);

        assert_eq!(
            ctx.latest_sensor_frame().unwrap().timestamp(),
            UniversalTime(77 + OFFSET)
        );
    }
}
