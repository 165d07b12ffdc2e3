//! # Perform Runtime
//!
//! 表演（perform）动画调度器：脚本命令触发的短时叠加特效。
//!
//! ## 架构概述
//!
//! 一个表演由静态的 [`EffectDefinition`] 描述，经 [`resolve`] 校验后交给
//! 唯一的纯函数内核 [`compute_visual_state`] 解释。运行时实例只负责累加时间、
//! 把内核结果写回自己创建的节点，并在结束时注销自己。
//!
//! ```text
//! Script          PerformStage                    Renderer
//!   │                  │                              │
//!   │── perform(name) ─►│ registry → instance          │
//!   │                  │      └─ insert nodes ───────►│ SceneLayer
//!   │                  │                              │
//!   │                  │◄──── update(delta_frames) ───│ 每帧
//!   │                  │ scheduler.tick → kernel      │
//!   │                  │      └─ opacity/position ───►│
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use perform_runtime::{PerformConfig, PerformStage};
//!
//! let mut stage = PerformStage::new(&PerformConfig::default())?;
//! stage.perform("enSweat")?;
//!
//! loop {
//!     stage.update(1.0);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`geometry`]：坐标与屏幕尺寸
//! - [`easing`]：缓动函数
//! - [`definition`]：表演定义（数据驱动）
//! - [`resolver`]：定义校验，换算为运行时参数
//! - [`kernel`]：相位计算内核
//! - [`scene`]：场景层与节点
//! - [`scheduler`]：每帧回调注册表
//! - [`instance`]：表演实例生命周期
//! - [`registry`]：表演名 → 工厂
//! - [`builtin`]：内置表演
//! - [`config`]：配置
//! - [`stage`]：门面

pub mod builtin;
pub mod config;
pub mod definition;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod instance;
pub mod kernel;
pub mod registry;
pub mod resolver;
pub mod scene;
pub mod scheduler;
pub mod stage;

// 重导出核心类型
pub use config::PerformConfig;
pub use definition::{
    Axis, EffectDefinition, LayerChoice, Motion, OpacityRule, PhaseBoundary, Timeline,
    VisualLayer,
};
pub use easing::EasingFunction;
pub use error::{PerformError, PerformResult};
pub use geometry::{AnchorRatio, ScreenGeometry, Vec2};
pub use instance::{EffectHandle, PerformInstance, PerformState};
pub use kernel::{LayerState, compute_visual_state};
pub use registry::{PerformFactory, PerformRegistry, register_all_performs};
pub use resolver::{ResolvedOpacity, ResolvedPerform, resolve};
pub use scene::{
    ContainerNode, ContainerRef, EffectLayer, KnownTextures, NodeFactory, NodeRef,
    PlainNodeFactory, RenderNode, SceneContext, SceneLayer,
};
pub use scheduler::{FRAME_RATE, TickControl, TickScheduler, Ticker, frames_to_seconds};
pub use stage::PerformStage;
