//! 内核配置
//!
//! 所有字段都有默认值，JSON 中缺省的字段按默认值补齐。

use crate::error::ConfigError;
use crate::propagation::PropagationConfig;
use crate::snap::SnapConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub snap: SnapConfig,
    pub propagation: PropagationConfig,
}

impl KernelConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "kernel config loaded");
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
