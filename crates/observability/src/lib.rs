//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式，RUST_LOG 优先)
//! - Prometheus 指标导出（配置端口时启用）
//! - 帧采集指标收集与统计
//!
//! ## 使用示例
//!
//! ```ignore
//! let config = config_loader::ConfigLoader::new().load(path)?;
//! observability::init_with_config(&config.observability)?;
//!
//! observability::record_frame_produced(&frame);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use contracts::{LogFormatSetting, ObservabilitySettings};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

// Re-exports
pub use crate::metrics::{
    describe_metrics, record_frame_arrived, record_frame_produced, record_frame_skipped,
    record_sink_delivery_ms, record_sink_dropped, FrameMetricsAggregator, MetricsSummary,
    RunningStats, SensorSummary, StatsSummary,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// 以默认设置初始化（Compact 日志，info 级别，不导出 Prometheus）
pub fn init() -> Result<()> {
    init_with_config(&ObservabilitySettings::default())
}

/// 按配置初始化 Tracing，并在设置了 `metrics_port` 时启动 Prometheus 导出
pub fn init_with_config(settings: &ObservabilitySettings) -> Result<()> {
    init_tracing(settings.log_format, &settings.log_level)?;

    if let Some(port) = settings.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?settings.log_format,
        metrics_port = ?settings.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 用于 Tracing 已由其他模块初始化的场景。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;
    describe_metrics();

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

fn init_tracing(format: LogFormatSetting, default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt_layer(format))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

fn fmt_layer(format: LogFormatSetting) -> BoxedLayer {
    match format {
        LogFormatSetting::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormatSetting::Pretty => fmt::layer().pretty().boxed(),
        LogFormatSetting::Compact => fmt::layer().compact().with_thread_names(true).boxed(),
    }
}
