//! ChannelSink - hands frames to an async consumer

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{SensorFrame, SensorFrameSink};
use tracing::{trace, warn};

use crate::metrics::SinkMetrics;

/// Consumer end of a [`ChannelSink`]
pub type FrameReceiver = Receiver<Arc<SensorFrame>>;

/// Sink backed by a bounded `async-channel` queue.
///
/// `send` never blocks the arrival thread: when the queue is full the incoming
/// frame is dropped and counted.
pub struct ChannelSink {
    name: String,
    tx: Sender<Arc<SensorFrame>>,
    metrics: Arc<SinkMetrics>,
}

impl ChannelSink {
    /// Create a sink and the receiver its frames are delivered to
    pub fn bounded(name: impl Into<String>, capacity: usize) -> (Self, FrameReceiver) {
        let (tx, rx) = async_channel::bounded(capacity.max(1));
        let name = name.into();
        let sink = Self {
            metrics: Arc::new(SinkMetrics::new(name.clone())),
            name,
            tx,
        };
        (sink, rx)
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Close the channel; consumers drain what is queued and then stop
    pub fn close(&self) -> bool {
        self.tx.close()
    }
}

impl SensorFrameSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, frame: Arc<SensorFrame>) {
        match self.tx.try_send(frame) {
            Ok(()) => {
                self.metrics.record_delivered();
                self.metrics.set_queue_len(self.tx.len());
                trace!(sink = %self.name, queue_len = self.tx.len(), "frame queued");
            }
            Err(TrySendError::Full(frame)) => {
                self.metrics.record_dropped("queue_full");
                warn!(
                    sink = %self.name,
                    sensor_type = %frame.sensor_type(),
                    timestamp = frame.timestamp().ticks(),
                    "Queue full, frame dropped"
                );
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.record_dropped("closed");
                warn!(sink = %self.name, "Channel closed, frame dropped");
            }
        }
    }
}
