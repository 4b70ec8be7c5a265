//! 配置校验模块
//!
//! 校验规则：
//! - derive 规则 (至少一个传感器流、sink 名称非空、queue_capacity > 0)
//! - sensor_type 不重复
//! - sink 名称唯一
//! - file sink 必须提供 base_path

use std::collections::HashSet;

use contracts::{ContractError, SinkType, StreamingConfig};
use validator::Validate;

/// 校验 StreamingConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &StreamingConfig) -> Result<(), ContractError> {
    validate_derive_rules(config)?;
    validate_sensor_types(config)?;
    validate_sink_names(config)?;
    validate_sink_params(config)?;
    Ok(())
}

/// 字段级规则，由 `#[validate]` 声明
fn validate_derive_rules(config: &StreamingConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|key| key.to_string())
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

/// 同一传感器只能出现一次
fn validate_sensor_types(config: &StreamingConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sensor) in config.sensors.iter().enumerate() {
        if !seen.insert(sensor.sensor_type) {
            return Err(ContractError::config_validation(
                format!("sensors[{idx}].sensor_type"),
                format!("duplicate sensor_type '{}'", sensor.sensor_type),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 名称唯一性
fn validate_sink_names(config: &StreamingConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 必填参数
fn validate_sink_params(config: &StreamingConfig) -> Result<(), ContractError> {
    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.sink_type == SinkType::File
            && sink.params.get("base_path").is_none_or(|p| p.is_empty())
        {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].params.base_path"),
                "file sink requires base_path",
            ));
        }
    }
    Ok(())
}
