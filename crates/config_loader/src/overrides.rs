//! `key=value` overrides applied on top of a loaded config
//!
//! Supported keys:
//! - `sensors.<sensor_type>.enabled` (adds the stream if the file does not list it)
//! - `sinks.<name>.queue_capacity`
//! - `sinks.<name>.params.<param>`
//! - `observability.log_level`, `observability.log_format`, `observability.metrics_port`

use std::fmt::Display;
use std::str::FromStr;

use contracts::{ContractError, SensorStreamConfig, SensorType, SinkConfig, StreamingConfig};
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OverrideTarget {
    SensorEnabled(SensorType),
    SinkQueueCapacity(String),
    SinkParam { sink: String, param: String },
    LogLevel,
    LogFormat,
    MetricsPort,
}

/// One parsed `key=value` override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOverride {
    key: String,
    target: OverrideTarget,
    value: String,
}

impl ConfigOverride {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Apply to `config`. Values are type-checked here; cross-field rules are
    /// left to validation, which runs afterwards.
    pub fn apply(&self, config: &mut StreamingConfig) -> Result<(), ContractError> {
        match &self.target {
            OverrideTarget::SensorEnabled(sensor_type) => {
                let enabled: bool = self.parse_value()?;
                match config
                    .sensors
                    .iter_mut()
                    .find(|sensor| sensor.sensor_type == *sensor_type)
                {
                    Some(sensor) => sensor.enabled = enabled,
                    None => config.sensors.push(SensorStreamConfig {
                        sensor_type: *sensor_type,
                        enabled,
                    }),
                }
            }
            OverrideTarget::SinkQueueCapacity(sink) => {
                let capacity: usize = self.parse_value()?;
                self.sink_mut(config, sink)?.queue_capacity = capacity;
            }
            OverrideTarget::SinkParam { sink, param } => {
                self.sink_mut(config, sink)?
                    .params
                    .insert(param.clone(), self.value.clone());
            }
            OverrideTarget::LogLevel => config.observability.log_level = self.value.clone(),
            OverrideTarget::LogFormat => {
                config.observability.log_format =
                    parse_enum(&self.value).map_err(|e| self.invalid_value(e))?;
            }
            OverrideTarget::MetricsPort => {
                config.observability.metrics_port = match self.value.as_str() {
                    "" | "none" => None,
                    _ => Some(self.parse_value()?),
                };
            }
        }

        info!(key = %self.key, value = %self.value, "config override applied");
        Ok(())
    }

    fn sink_mut<'a>(
        &self,
        config: &'a mut StreamingConfig,
        name: &str,
    ) -> Result<&'a mut SinkConfig, ContractError> {
        config
            .sinks
            .iter_mut()
            .find(|sink| sink.name == name)
            .ok_or_else(|| {
                ContractError::config_validation(&self.key, format!("no sink named '{name}'"))
            })
    }

    fn parse_value<T>(&self) -> Result<T, ContractError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.value.parse().map_err(|e| self.invalid_value(e))
    }

    fn invalid_value(&self, err: impl Display) -> ContractError {
        ContractError::config_validation(
            &self.key,
            format!("invalid value '{}': {err}", self.value),
        )
    }
}

impl FromStr for ConfigOverride {
    type Err = ContractError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (key, value) = spec.split_once('=').ok_or_else(|| {
            ContractError::config_parse(format!("override '{spec}' is not of the form key=value"))
        })?;
        let key = key.trim();

        let segments: Vec<&str> = key.split('.').collect();
        let target = match segments.as_slice() {
            ["sensors", sensor, "enabled"] => OverrideTarget::SensorEnabled(
                parse_enum(sensor)
                    .map_err(|e| ContractError::config_parse(format!("override '{key}': {e}")))?,
            ),
            ["sinks", sink, "queue_capacity"] => OverrideTarget::SinkQueueCapacity(sink.to_string()),
            ["sinks", sink, "params", param] => OverrideTarget::SinkParam {
                sink: sink.to_string(),
                param: param.to_string(),
            },
            ["observability", "log_level"] => OverrideTarget::LogLevel,
            ["observability", "log_format"] => OverrideTarget::LogFormat,
            ["observability", "metrics_port"] => OverrideTarget::MetricsPort,
            _ => {
                return Err(ContractError::config_parse(format!(
                    "unknown override key '{key}'"
                )))
            }
        };

        Ok(Self {
            key: key.to_string(),
            target,
            value: value.trim().to_string(),
        })
    }
}

/// Parse a snake_case unit variant through its serde representation
fn parse_enum<T: DeserializeOwned>(raw: &str) -> Result<T, ValueError> {
    let deserializer: StrDeserializer<'_, ValueError> = raw.into_deserializer();
    T::deserialize(deserializer)
}
