//! 帧采集指标收集模块
//!
//! 记录每个传感器上下文的到达、产出、跳过与 sink 投递指标。

use std::collections::HashMap;

use contracts::{SensorFrame, SensorType, TICKS_PER_SECOND};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// 记录到达通知
pub fn record_frame_arrived(sensor_type: SensorType) {
    counter!(
        "frame_ingest_arrivals_total",
        "sensor_type" => sensor_type.as_str()
    )
    .increment(1);
}

/// 记录产出的 SensorFrame
///
/// 每次 SensorFrame 构建完成并投递后调用。
pub fn record_frame_produced(frame: &SensorFrame) {
    let sensor_type = frame.sensor_type().as_str();
    let pose = if frame.has_frame_to_origin() {
        "available"
    } else {
        "unavailable"
    };

    counter!(
        "frame_ingest_frames_total",
        "sensor_type" => sensor_type,
        "pose" => pose
    )
    .increment(1);

    // 最新帧时间戳 (用于检测停流)
    gauge!(
        "frame_ingest_last_timestamp_ticks",
        "sensor_type" => sensor_type
    )
    .set(frame.timestamp().ticks() as f64);
}

/// 记录被跳过的到达
pub fn record_frame_skipped(sensor_type: SensorType, reason: &'static str) {
    counter!(
        "frame_ingest_frames_skipped_total",
        "sensor_type" => sensor_type.as_str(),
        "reason" => reason
    )
    .increment(1);
}

/// 记录 sink 投递耗时
pub fn record_sink_delivery_ms(sink_name: &str, latency_ms: f64) {
    histogram!(
        "frame_ingest_sink_delivery_ms",
        "sink" => sink_name.to_string()
    )
    .record(latency_ms);
}

/// 记录 sink 丢弃 (队列满 / 写入失败)
pub fn record_sink_dropped(sink_name: &str, reason: &'static str) {
    counter!(
        "frame_ingest_sink_dropped_total",
        "sink" => sink_name.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// 注册指标说明（导出端展示 HELP 文本）
pub fn describe_metrics() {
    describe_counter!(
        "frame_ingest_arrivals_total",
        Unit::Count,
        "Frame arrival notifications handled"
    );
    describe_counter!(
        "frame_ingest_frames_total",
        Unit::Count,
        "SensorFrames produced, labelled by pose availability"
    );
    describe_gauge!(
        "frame_ingest_last_timestamp_ticks",
        "Timestamp of the latest produced frame (100 ns ticks since 1601)"
    );
    describe_counter!(
        "frame_ingest_frames_skipped_total",
        Unit::Count,
        "Arrivals that produced no frame, labelled by reason"
    );
    describe_histogram!(
        "frame_ingest_sink_delivery_ms",
        Unit::Milliseconds,
        "Time spent in the sink per frame"
    );
    describe_counter!(
        "frame_ingest_sink_dropped_total",
        Unit::Count,
        "Frames a sink dropped or failed to write"
    );
}

/// 帧指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct FrameMetricsAggregator {
    sensors: HashMap<SensorType, SensorAggregate>,
}

#[derive(Debug, Clone, Default)]
struct SensorAggregate {
    frames: u64,
    frames_without_pose: u64,
    skipped: HashMap<&'static str, u64>,
    last_timestamp: Option<i64>,
    interval_ms: RunningStats,
}

impl FrameMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新产出帧统计
    pub fn record_frame(&mut self, frame: &SensorFrame) {
        let entry = self.sensors.entry(frame.sensor_type()).or_default();
        entry.frames += 1;
        if !frame.has_frame_to_origin() {
            entry.frames_without_pose += 1;
        }

        let ticks = frame.timestamp().ticks();
        if let Some(last) = entry.last_timestamp {
            let delta_ms = (ticks - last) as f64 * 1000.0 / TICKS_PER_SECOND as f64;
            entry.interval_ms.push(delta_ms);
        }
        entry.last_timestamp = Some(ticks);
    }

    /// 更新跳过统计
    pub fn record_skip(&mut self, sensor_type: SensorType, reason: &'static str) {
        *self
            .sensors
            .entry(sensor_type)
            .or_default()
            .skipped
            .entry(reason)
            .or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let mut sensors: Vec<_> = self
            .sensors
            .iter()
            .map(|(sensor_type, agg)| SensorSummary {
                sensor_type: *sensor_type,
                frames: agg.frames,
                frames_without_pose: agg.frames_without_pose,
                skipped: agg.skipped.values().sum(),
                frame_interval_ms: StatsSummary::from(&agg.interval_ms),
            })
            .collect();
        sensors.sort_by_key(|s| s.sensor_type);

        MetricsSummary { sensors }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub sensors: Vec<SensorSummary>,
}

/// 单传感器摘要
#[derive(Debug, Clone)]
pub struct SensorSummary {
    pub sensor_type: SensorType,
    pub frames: u64,
    pub frames_without_pose: u64,
    pub skipped: u64,
    pub frame_interval_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Frame Ingest Summary ===")?;
        for sensor in &self.sensors {
            writeln!(f, "{}:", sensor.sensor_type)?;
            writeln!(f, "  frames: {}", sensor.frames)?;
            writeln!(f, "  without pose: {}", sensor.frames_without_pose)?;
            writeln!(f, "  skipped: {}", sensor.skipped)?;
            writeln!(f, "  interval (ms): {}", sensor.frame_interval_ms)?;
        }
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
