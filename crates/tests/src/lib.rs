//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需真实设备）

#[cfg(test)]
mod contract_tests {
    use contracts::{Float4x4, SensorType, UNIX_EPOCH_TICKS, UniversalTime};

    #[test]
    fn test_sensor_type_wire_names() {
        let names: Vec<_> = SensorType::ALL
            .iter()
            .map(|s| serde_json_name(*s))
            .collect();
        assert_eq!(
            names,
            vec![
                "photo_video",
                "short_throw_to_f_depth",
                "short_throw_to_f_reflectivity",
                "long_throw_to_f_depth",
                "long_throw_to_f_reflectivity",
                "visible_light_left_left",
                "visible_light_left_front",
                "visible_light_right_front",
                "visible_light_right_right",
            ]
        );
    }

    fn serde_json_name(sensor_type: SensorType) -> String {
        serde_json::to_value(sensor_type)
            .unwrap()
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_time_and_matrix_layout() {
        assert_eq!(
            UniversalTime(UNIX_EPOCH_TICKS).to_system_time(),
            Some(std::time::UNIX_EPOCH)
        );
        assert_eq!(Float4x4::SIZE, 64);
        assert!(Float4x4::ZERO.is_zero());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        Float4x4, FrameProperties, FrameSource, PinholeProjection, PropertyValue, SensorFrame,
        SensorType, UniversalTime, TICKS_PER_SECOND,
    };
    use ingestion::{
        MediaFrameReaderContext, MockFrameSource, MockFrameSourceConfig, MockSpatialPerception,
        TimeConverter, CAMERA_COORDINATE_SYSTEM, SENSOR_STREAMING_CAMERA_INTRINSICS,
    };
    use observability::FrameMetricsAggregator;
    use sinks::{create_sinks, FrameReceiver};
    use tokio::time::timeout;

    const STREAMING_TOML: &str = r#"
[[sensors]]
sensor_type = "photo_video"

[[sensors]]
sensor_type = "visible_light_left_front"

[[sensors]]
sensor_type = "long_throw_to_f_depth"
enabled = false

[[sinks]]
name = "log"
sink_type = "log"

[[sinks]]
name = "frames"
sink_type = "channel"
queue_capacity = 256
"#;

    fn source_for(
        sensor_type: SensorType,
        perception: &MockSpatialPerception,
        camera_to_origin: Float4x4,
    ) -> MockFrameSource {
        let properties = FrameProperties::new()
            .with(
                CAMERA_COORDINATE_SYSTEM,
                PropertyValue::CoordinateSystem(
                    perception.camera_coordinate_system(camera_to_origin),
                ),
            )
            .with(
                SENSOR_STREAMING_CAMERA_INTRINSICS,
                PropertyValue::CameraIntrinsics(Arc::new(PinholeProjection {
                    focal_length: [100.0, 100.0],
                    principal_point: [32.0, 24.0],
                })),
            );

        MockFrameSource::new(
            sensor_type,
            MockFrameSourceConfig {
                frequency_hz: 100.0,
                image_width: 16,
                image_height: 8,
                ..Default::default()
            },
        )
        .with_frame_properties(properties)
    }

    async fn recv_frame(rx: &FrameReceiver) -> Arc<SensorFrame> {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("channel closed")
    }

    /// End-to-end test: config -> sinks -> MockFrameSource -> context -> channel consumer
    ///
    /// 验证完整的数据流：
    /// 1. ConfigLoader 解析并校验配置
    /// 2. create_sinks 构建 log + channel sink
    /// 3. MockFrameSource 在后台线程推帧，context 产出 SensorFrame
    /// 4. 异步消费端按到达顺序收到帧
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let config = ConfigLoader::new()
            .parse(STREAMING_TOML, ConfigFormat::Toml)
            .unwrap();
        let mut sink_set = create_sinks(&config.sinks).unwrap();
        let rx = sink_set.take_receiver("frames").unwrap();
        let sink = sink_set.sink();

        let perception = Arc::new(MockSpatialPerception::new());
        let camera_to_origin = Float4x4::translation(0.5, 1.5, -2.0);

        let mut sources = Vec::new();
        let mut contexts = Vec::new();
        for sensor_type in config.enabled_sensors() {
            let source = source_for(sensor_type, &perception, camera_to_origin);
            let converter =
                TimeConverter::from_reference(source.relative_now(), UniversalTime::now());
            let context = Arc::new(MediaFrameReaderContext::new(
                sensor_type,
                perception.clone(),
                perception.clone(),
                Some(sink.clone()),
                converter,
            ));
            source.listen(context.arrival_callback());
            sources.push(source);
            contexts.push(context);
        }
        assert_eq!(contexts.len(), 2);

        let mut aggregator = FrameMetricsAggregator::new();
        let mut last_ticks = std::collections::HashMap::new();
        let started = UniversalTime::now();
        for _ in 0..20 {
            let frame = recv_frame(&rx).await;
            aggregator.record_frame(&frame);

            assert!(frame.has_frame_to_origin());
            assert_eq!(frame.frame_to_origin(), camera_to_origin);
            assert!(!frame.has_camera_view_transform());

            let intrinsics = frame.camera_intrinsics().unwrap();
            let expected_width = match frame.sensor_type() {
                SensorType::VisibleLightLeftFront => 64,
                _ => 16,
            };
            assert_eq!(intrinsics.image_width(), expected_width);
            assert_eq!(intrinsics.image_height(), 8);

            // absolute timestamps track wall clock and are per-sensor monotonic
            let ticks = frame.timestamp().ticks();
            assert!((ticks - started.ticks()).abs() < 5 * TICKS_PER_SECOND);
            let previous = last_ticks.insert(frame.sensor_type(), ticks);
            if let Some(previous) = previous {
                assert!(ticks > previous);
            }
        }

        for source in &sources {
            source.stop();
        }

        for context in &contexts {
            let stats = context.stats();
            assert!(stats.frames_produced > 0);
            assert_eq!(stats.timestamp_failures, 0);
            assert_eq!(stats.panics, 0);
            assert!(context.latest_sensor_frame().is_some());
        }

        let summary = aggregator.summary();
        assert_eq!(summary.sensors.iter().map(|s| s.frames).sum::<u64>(), 20);
        assert!(summary.sensors.iter().all(|s| s.frames_without_pose == 0));

        let metrics: std::collections::HashMap<_, _> = sink_set.metrics().into_iter().collect();
        assert!(metrics["log"].delivered >= 20);
        assert!(metrics["frames"].delivered >= 20);
    }

    /// 感知时间戳不可用时，帧被丢弃，sink 与缓存均不更新
    #[tokio::test]
    async fn test_e2e_timestamp_failure_drops_frames() {
        let mut sink_set = create_sinks(&[contracts::SinkConfig {
            name: "frames".to_string(),
            sink_type: contracts::SinkType::Channel,
            queue_capacity: 64,
            params: Default::default(),
        }])
        .unwrap();
        let rx = sink_set.take_receiver("frames").unwrap();

        let perception = Arc::new(MockSpatialPerception::new());
        perception.set_timestamp_failure(true);

        let source = source_for(SensorType::PhotoVideo, &perception, Float4x4::IDENTITY);
        let context = Arc::new(MediaFrameReaderContext::new(
            SensorType::PhotoVideo,
            perception.clone(),
            perception.clone(),
            Some(sink_set.sink()),
            TimeConverter::from_reference(source.relative_now(), UniversalTime::now()),
        ));
        source.listen(context.arrival_callback());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.is_empty());
        assert!(context.latest_sensor_frame().is_none());
        assert!(context.stats().timestamp_failures > 0);

        // tracking recovers: frames flow again
        perception.set_timestamp_failure(false);
        let frame = recv_frame(&rx).await;
        assert_eq!(frame.sensor_type(), SensorType::PhotoVideo);
        source.stop();
    }

    /// Recorder sink configured from a file writes images and the pose trace
    #[tokio::test]
    async fn test_e2e_file_recorder() {
        let out = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        let config_path = config_dir.path().join("streaming.json");
        std::fs::write(
            &config_path,
            r#"{
                "sensors": [{ "sensor_type": "short_throw_to_f_depth" }],
                "sinks": [{ "name": "rec", "sink_type": "file" }]
            }"#,
        )
        .unwrap();

        let base_path = format!("sinks.rec.params.base_path={}", out.path().display());
        let config = ConfigLoader::new()
            .with_override(&base_path)
            .unwrap()
            .load(&config_path)
            .unwrap();
        let sink_set = create_sinks(&config.sinks).unwrap();

        let perception = Arc::new(MockSpatialPerception::new());
        let source = source_for(
            SensorType::ShortThrowToFDepth,
            &perception,
            Float4x4::IDENTITY,
        );
        let context = Arc::new(MediaFrameReaderContext::new(
            SensorType::ShortThrowToFDepth,
            perception.clone(),
            perception.clone(),
            Some(sink_set.sink()),
            TimeConverter::from_reference(source.relative_now(), UniversalTime::now()),
        ));
        source.listen(context.arrival_callback());

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while context.stats().frames_produced < 3 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        source.stop();
        // let an in-flight arrival finish
        tokio::time::sleep(Duration::from_millis(30)).await;

        let produced = context.stats().frames_produced;
        assert!(produced >= 3);

        let csv =
            std::fs::read_to_string(out.path().join("short_throw_to_f_depth.csv")).unwrap();
        let rows: Vec<_> = csv.lines().skip(1).collect();
        assert_eq!(rows.len() as u64, produced);
        for row in rows {
            let image_file = row.split(',').nth(1).unwrap();
            assert!(out.path().join(image_file).exists());
        }
    }
}
