//! # Definition 模块
//!
//! 表演定义：每种表演的静态描述（图层、锚点、时间轴）。
//!
//! 定义本身只是数据，不做校验；校验和换算由 [`resolve`](crate::resolve) 负责。
//! 定义可以在代码中构造（见 [`builtin`](crate::builtin)），也可以从 JSON 加载。

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::geometry::{AnchorRatio, Vec2};

/// 表演挂载的场景层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerChoice {
    /// 前景特效层
    #[default]
    Foreground,
    /// 背景特效层
    Background,
}

impl std::fmt::Display for LayerChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerChoice::Foreground => write!(f, "foreground"),
            LayerChoice::Background => write!(f, "background"),
        }
    }
}

/// 表演内的一个子图层（如气泡、点）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualLayer {
    /// 子图层名称
    pub name: String,
    /// 纹理路径
    pub texture: String,
    /// 相对锚点的偏移（像素）
    #[serde(default)]
    pub offset: Vec2,
    /// 缩放
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// 出现时刻（秒）；在此之前透明度为 0
    #[serde(default)]
    pub appear_at: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl VisualLayer {
    /// 创建位于锚点、立即出现的子图层
    pub fn new(name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: texture.into(),
            offset: Vec2::zero(),
            scale: default_scale(),
            appear_at: 0.0,
        }
    }

    /// 设置偏移
    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vec2::new(x, y);
        self
    }

    /// 设置缩放
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// 设置出现时刻
    pub fn with_appear_at(mut self, appear_at: f32) -> Self {
        self.appear_at = appear_at;
        self
    }
}

/// 透明度规则
///
/// 每种规则对应一类阶段构件；所有子图层共享同一规则，
/// 再叠加各自的 `appear_at`。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpacityRule {
    /// 全程不透明
    #[default]
    Constant,
    /// 闪烁：显示 `show` 秒 → 隐藏 `hide` 秒 → 一直显示
    Blink { show: f32, hide: f32 },
    /// 末尾淡出：最后 `fade_out` 秒内按剩余时间 1 → 0
    TrailingFade { fade_out: f32 },
    /// 按进度淡出：进度达到 `start` 后线性 1 → 0
    ProgressFade { start: f32 },
    /// 全部出现后保持 `hold` 秒，再整体淡出 `fade_out` 秒
    ///
    /// 总时长由最后一个子图层的出现时刻推导，不需要显式 `duration`。
    HoldThenFade { hold: f32, fade_out: f32 },
}

/// 位移轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
}

/// 缓动位移：偏移 = `-distance * ease(p)`
///
/// 正的 `distance` 表示向左（X）或向上（Y）移动。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    #[serde(default)]
    pub axis: Axis,
    pub distance: f32,
    #[serde(default)]
    pub easing: EasingFunction,
}

/// 时间轴
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// 总时长（秒）；`HoldThenFade` 规则下由图层推导
    #[serde(default)]
    pub duration: Option<f32>,
    /// 透明度规则
    #[serde(default)]
    pub opacity: OpacityRule,
    /// 位移（可选）
    #[serde(default)]
    pub motion: Option<Motion>,
}

/// 命名的阶段边界
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseBoundary {
    pub name: String,
    /// 相对表演开始的时刻（秒）
    pub at: f32,
}

impl PhaseBoundary {
    fn new(name: impl Into<String>, at: f32) -> Self {
        Self {
            name: name.into(),
            at,
        }
    }
}

/// 最后一个子图层的出现时刻
pub(crate) fn last_appearance(layers: &[VisualLayer]) -> f32 {
    layers
        .iter()
        .map(|layer| layer.appear_at)
        .fold(0.0, f32::max)
}

impl Timeline {
    /// 总时长
    ///
    /// 显式时长缺失且规则无法推导时返回 `None`。
    pub fn total_duration(&self, layers: &[VisualLayer]) -> Option<f32> {
        match self.opacity {
            OpacityRule::HoldThenFade { hold, fade_out } => {
                Some(last_appearance(layers) + hold + fade_out)
            }
            _ => self.duration,
        }
    }

    /// 规则自身的阶段边界，按时间轴语义顺序排列（未排序）
    pub(crate) fn rule_boundaries(&self, layers: &[VisualLayer]) -> Vec<PhaseBoundary> {
        let Some(end) = self.total_duration(layers) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        match self.opacity {
            OpacityRule::Constant => {}
            OpacityRule::Blink { show, hide } => {
                out.push(PhaseBoundary::new("blink-show-end", show));
                out.push(PhaseBoundary::new("blink-hide-end", show + hide));
            }
            OpacityRule::TrailingFade { fade_out } => {
                out.push(PhaseBoundary::new("fade-start", end - fade_out));
                out.push(PhaseBoundary::new("fade-end", end));
            }
            OpacityRule::ProgressFade { start } => {
                out.push(PhaseBoundary::new("fade-start", end * start));
                out.push(PhaseBoundary::new("fade-end", end));
            }
            OpacityRule::HoldThenFade { hold, fade_out } => {
                let fade_start = last_appearance(layers) + hold;
                out.push(PhaseBoundary::new("fade-start", fade_start));
                out.push(PhaseBoundary::new("fade-end", fade_start + fade_out));
            }
        }
        out.push(PhaseBoundary::new("end", end));
        out
    }

    /// 全部命名阶段边界（子图层出现 + 规则边界），按时间排序
    pub fn boundaries(&self, layers: &[VisualLayer]) -> Vec<PhaseBoundary> {
        let mut out: Vec<PhaseBoundary> = layers
            .iter()
            .map(|layer| PhaseBoundary::new(format!("appear:{}", layer.name), layer.appear_at))
            .collect();
        out.extend(self.rule_boundaries(layers));
        out.sort_by(|a, b| a.at.total_cmp(&b.at));
        out
    }
}

/// 表演定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// 表演名（注册表查找键）
    pub name: String,
    /// 默认 ticker key
    pub ticker_key: String,
    /// 挂载的场景层
    #[serde(default)]
    pub layer: LayerChoice,
    /// 锚点（屏幕比例）
    pub anchor: AnchorRatio,
    /// 子图层，自底向上
    pub layers: Vec<VisualLayer>,
    /// 时间轴
    pub timeline: Timeline,
    /// 结束时是否同时隐藏容器
    #[serde(default)]
    pub hide_on_complete: bool,
}

impl EffectDefinition {
    /// 全部命名阶段边界
    pub fn boundaries(&self) -> Vec<PhaseBoundary> {
        self.timeline.boundaries(&self.layers)
    }

    /// 总时长
    pub fn total_duration(&self) -> Option<f32> {
        self.timeline.total_duration(&self.layers)
    }
}
