//! 配置文件格式
//!
//! 按扩展名选择 TOML 或 JSON，反序列化错误保留原始 source。

use std::fmt;
use std::path::Path;

use contracts::{ContractError, StreamingConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 根据文件扩展名判断格式 (大小写不敏感)
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ContractError::config_parse(format!(
                "unsupported config format for '{}', expected .toml or .json",
                path.display()
            ))),
        }
    }

    /// 反序列化为 `StreamingConfig`，未知字段直接报错
    pub(crate) fn deserialize(self, content: &str) -> Result<StreamingConfig, ContractError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| self.parse_error(e)),
            Self::Json => serde_json::from_str(content).map_err(|e| self.parse_error(e)),
        }
    }

    fn parse_error<E>(self, err: E) -> ContractError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ContractError::ConfigParse {
            message: format!("invalid {self} config: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => f.write_str("TOML"),
            Self::Json => f.write_str("JSON"),
        }
    }
}
