//! # Config 模块
//!
//! 表演系统配置。
//!
//! ## 配置来源
//!
//! 1. 配置文件（JSON）
//! 2. 默认值：默认屏幕尺寸、启用全部内置表演、无额外定义

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::definition::EffectDefinition;
use crate::error::{PerformError, PerformResult};
use crate::geometry::ScreenGeometry;
use crate::resolver::resolve;

/// 表演系统配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformConfig {
    /// 屏幕尺寸（用于换算锚点）
    #[serde(default)]
    pub screen: ScreenGeometry,

    /// 额外的数据驱动表演定义
    #[serde(default)]
    pub definitions: Vec<EffectDefinition>,

    /// 不注册的内置表演名
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl PerformConfig {
    /// 加载配置文件
    ///
    /// 文件不存在或解析失败时返回默认配置并输出警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                info!(path = ?path, definitions = config.definitions.len(), "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 严格读取配置文件
    pub fn read(path: impl AsRef<Path>) -> PerformResult<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| PerformError::ConfigIo(e.to_string()))?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(content: &str) -> PerformResult<Self> {
        serde_json::from_str(content).map_err(|e| PerformError::ConfigParse(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> PerformResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PerformError::ConfigParse(e.to_string()))?;
        fs::write(path, json).map_err(|e| PerformError::ConfigIo(e.to_string()))
    }

    /// 验证配置有效性
    ///
    /// 屏幕尺寸必须为正；每个额外定义都必须能被解析，且名字不重复。
    pub fn validate(&self) -> PerformResult<()> {
        if !(self.screen.width > 0.0 && self.screen.height > 0.0) {
            return Err(PerformError::ConfigParse(format!(
                "屏幕尺寸必须为正: {}x{}",
                self.screen.width, self.screen.height
            )));
        }

        let mut seen = HashSet::new();
        for def in &self.definitions {
            if !seen.insert(def.name.as_str()) {
                return Err(PerformError::invalid_definition(&def.name, "表演名重复"));
            }
            resolve(def, &self.screen)?;
        }
        Ok(())
    }

    /// 内置表演是否被禁用
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}
