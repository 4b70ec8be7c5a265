//! # Sinks
//!
//! SensorFrame 下游输出模块。
//!
//! 负责：
//! - 接收 ingestion 推送的 `Arc<SensorFrame>`
//! - 日志 / 通道 / 落盘三类 sink，以及按顺序 fan-out
//! - sink 内部失败只记录，不回传到到达线程

pub mod error;
pub mod factory;
pub mod metrics;
pub mod sinks;

pub use contracts::{SensorFrame, SensorFrameSink};
pub use error::SinkError;
pub use factory::{create_sink, create_sinks, CreatedSink, SinkSet};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{ChannelSink, FanoutSink, FileSink, FileSinkConfig, FrameReceiver, LogSink};
