//! StreamingConfig - Config Loader output
//!
//! Describes which sensor streams to ingest, where completed frames go, and how
//! diagnostics are emitted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::SensorType;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StreamingConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sensor streams to ingest
    #[validate(length(min = 1, message = "at least one sensor stream is required"))]
    pub sensors: Vec<SensorStreamConfig>,

    /// Output routing
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,

    /// Logging / metrics settings
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilitySettings,
}

impl StreamingConfig {
    /// Sensor types with `enabled = true`, in declaration order
    pub fn enabled_sensors(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.sensors
            .iter()
            .filter(|sensor| sensor.enabled)
            .map(|sensor| sensor.sensor_type)
    }
}

/// Per-sensor stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorStreamConfig {
    pub sensor_type: SensorType,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity (channel sinks)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "queue_capacity must be > 0"))]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    8
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Frame summaries via tracing
    Log,
    /// Recorder writing images and pose CSV to disk
    File,
    /// Bounded in-process channel
    Channel,
}

/// Diagnostics settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ObservabilitySettings {
    #[serde(default)]
    pub log_format: LogFormatSetting,

    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,

    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormatSetting::default(),
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormatSetting {
    Json,
    Pretty,
    #[default]
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: StreamingConfig = serde_json::from_str(
            r#"{ "sensors": [ { "sensor_type": "photo_video" },
                              { "sensor_type": "visible_light_left_front", "enabled": false } ] }"#,
        )
        .unwrap();

        assert_eq!(config.version, ConfigVersion::V1);
        assert!(config.sinks.is_empty());
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(
            config.enabled_sensors().collect::<Vec<_>>(),
            vec![SensorType::PhotoVideo]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derive_rules_reject_empty_sink_name() {
        let config = StreamingConfig {
            version: ConfigVersion::V1,
            sensors: vec![SensorStreamConfig {
                sensor_type: SensorType::PhotoVideo,
                enabled: true,
            }],
            sinks: vec![SinkConfig {
                name: String::new(),
                sink_type: SinkType::Log,
                queue_capacity: 8,
                params: HashMap::new(),
            }],
            observability: ObservabilitySettings::default(),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let misspelled = serde_json::from_str::<StreamingConfig>(
            r#"{ "sensors": [ { "sensor_type": "photo_video", "enable": false } ] }"#,
        );
        let err = misspelled.err().unwrap().to_string();
        assert!(err.contains("unknown field `enable`"), "{err}");
    }
}
