//! Sink factory - builds sinks from `SinkConfig`

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{SensorFrameSink, SinkConfig, SinkType};
use tracing::{info, instrument};

use crate::error::SinkError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{ChannelSink, FanoutSink, FileSink, FrameReceiver, LogSink};

/// A sink built from configuration
pub struct CreatedSink {
    pub sink: Arc<dyn SensorFrameSink>,
    /// Consumer end, for channel sinks
    pub receiver: Option<FrameReceiver>,
    pub metrics: Arc<SinkMetrics>,
}

/// Create one sink from configuration
#[instrument(
    name = "sinks_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<CreatedSink, SinkError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            let metrics = Arc::clone(sink.metrics());
            Ok(CreatedSink {
                sink: Arc::new(sink),
                receiver: None,
                metrics,
            })
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params).map_err(|e| match e {
                SinkError::MissingParam { .. } => e,
                other => SinkError::sink_creation(&config.name, other.to_string()),
            })?;
            let metrics = Arc::clone(sink.metrics());
            Ok(CreatedSink {
                sink: Arc::new(sink),
                receiver: None,
                metrics,
            })
        }
        SinkType::Channel => {
            let (sink, rx) = ChannelSink::bounded(&config.name, config.queue_capacity);
            let metrics = Arc::clone(sink.metrics());
            Ok(CreatedSink {
                sink: Arc::new(sink),
                receiver: Some(rx),
                metrics,
            })
        }
    }
}

/// All configured sinks behind one fan-out
pub struct SinkSet {
    fanout: Arc<FanoutSink>,
    receivers: HashMap<String, FrameReceiver>,
    metrics: Vec<(String, Arc<SinkMetrics>)>,
}

impl SinkSet {
    /// Sink to hand to the ingestion context
    pub fn sink(&self) -> Arc<dyn SensorFrameSink> {
        self.fanout.clone()
    }

    /// Take the receiver of the named channel sink
    pub fn take_receiver(&mut self, name: &str) -> Option<FrameReceiver> {
        self.receivers.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fanout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fanout.is_empty()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.metrics
            .iter()
            .map(|(name, m)| (name.clone(), m.snapshot()))
            .collect()
    }
}

/// Create every configured sink, in order, behind a [`FanoutSink`]
#[instrument(name = "sinks_create_sinks", skip(configs), fields(sink_count = configs.len()))]
pub fn create_sinks(configs: &[SinkConfig]) -> Result<SinkSet, SinkError> {
    let mut sinks = Vec::with_capacity(configs.len());
    let mut receivers = HashMap::new();
    let mut metrics = Vec::with_capacity(configs.len());

    for config in configs {
        let created = create_sink(config)?;
        if let Some(rx) = created.receiver {
            receivers.insert(config.name.clone(), rx);
        }
        metrics.push((config.name.clone(), created.metrics));
        sinks.push(created.sink);
    }

    info!(sinks = sinks.len(), "sinks created");

    Ok(SinkSet {
        fanout: Arc::new(FanoutSink::new("fanout", sinks)),
        receivers,
        metrics,
    })
}
