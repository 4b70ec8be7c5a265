//! FanoutSink - forwards each frame to several sinks

use std::sync::Arc;

use contracts::{SensorFrame, SensorFrameSink};

/// Forwards every frame to each inner sink, in registration order
pub struct FanoutSink {
    name: String,
    sinks: Vec<Arc<dyn SensorFrameSink>>,
}

impl FanoutSink {
    pub fn new(name: impl Into<String>, sinks: Vec<Arc<dyn SensorFrameSink>>) -> Self {
        Self {
            name: name.into(),
            sinks,
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

impl SensorFrameSink for FanoutSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, frame: Arc<SensorFrame>) {
        for sink in &self.sinks {
            sink.send(Arc::clone(&frame));
        }
    }
}
