//! # Error 模块
//!
//! 定义 perform-runtime 中使用的错误类型。
//!
//! 所有时长/参数错误都在构造阶段（[`resolve`](crate::resolve)）被拒绝，
//! 帧更新路径上不会产生错误。

use thiserror::Error;

/// 表演（perform）相关错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerformError {
    /// 时长或淡出窗口非正
    #[error("表演 '{name}' 的 {field} 无效: {value}（必须为正数）")]
    InvalidDuration {
        /// 表演名称
        name: String,
        /// 字段名
        field: String,
        /// 实际值
        value: f32,
    },

    /// 定义结构无效（空图层、非单调时间轴等）
    #[error("表演 '{name}' 定义无效: {message}")]
    InvalidDefinition {
        /// 表演名称
        name: String,
        /// 错误消息
        message: String,
    },

    /// 纹理无法解析
    #[error("纹理未找到: {path}")]
    MissingTexture {
        /// 纹理路径
        path: String,
    },

    /// ticker key 已被占用
    #[error("ticker key '{key}' 已注册")]
    DuplicateKey {
        /// 冲突的 key
        key: String,
    },

    /// 未注册的表演名
    #[error("未知表演: '{name}'")]
    UnknownEffect {
        /// 表演名称
        name: String,
    },

    /// 配置读取失败
    #[error("配置 IO 错误: {0}")]
    ConfigIo(String),

    /// 配置解析失败
    #[error("配置解析失败: {0}")]
    ConfigParse(String),
}

impl PerformError {
    /// 构造 `InvalidDuration`
    pub(crate) fn invalid_duration(name: &str, field: &str, value: f32) -> Self {
        Self::InvalidDuration {
            name: name.to_string(),
            field: field.to_string(),
            value,
        }
    }

    /// 构造 `InvalidDefinition`
    pub(crate) fn invalid_definition(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type PerformResult<T> = Result<T, PerformError>;
