//! # Resolver
//!
//! 把 [`EffectDefinition`] 校验并换算为 [`ResolvedPerform`]。
//!
//! 所有会导致帧更新时除零或阶段倒序的配置都在这里被拒绝，
//! 因此 kernel 和实例更新路径上不存在失败分支。

use crate::definition::{
    EffectDefinition, LayerChoice, Motion, OpacityRule, VisualLayer, last_appearance,
};
use crate::error::{PerformError, PerformResult};
use crate::geometry::{ScreenGeometry, Vec2};

/// 解析后的透明度规则（阶段边界已换算为绝对时刻）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedOpacity {
    Constant,
    Blink { show_end: f32, hide_end: f32 },
    TrailingFade { fade_out: f32 },
    ProgressFade { start: f32 },
    GroupFade { fade_start: f32, fade_out: f32 },
}

/// 解析后的表演参数
///
/// 参数已校验、锚点已换算为像素坐标，可以直接交给 kernel 计算。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPerform {
    pub name: String,
    pub ticker_key: String,
    pub layer: LayerChoice,
    /// 锚点（图层局部像素坐标）
    pub anchor: Vec2,
    pub layers: Vec<VisualLayer>,
    /// 总时长（秒），恒为正
    pub total_duration: f32,
    pub opacity: ResolvedOpacity,
    pub motion: Option<Motion>,
    pub hide_on_complete: bool,
}

/// 校验并解析表演定义
pub fn resolve(def: &EffectDefinition, screen: &ScreenGeometry) -> PerformResult<ResolvedPerform> {
    let name = def.name.as_str();

    if name.is_empty() {
        return Err(PerformError::invalid_definition(name, "表演名不能为空"));
    }
    if def.ticker_key.is_empty() {
        return Err(PerformError::invalid_definition(name, "ticker_key 不能为空"));
    }
    if def.layers.is_empty() {
        return Err(PerformError::invalid_definition(name, "至少需要一个子图层"));
    }

    for layer in &def.layers {
        if !layer.offset.is_finite() || !layer.scale.is_finite() || !layer.appear_at.is_finite()
        {
            return Err(PerformError::invalid_definition(
                name,
                format!("子图层 '{}' 含有非有限数值", layer.name),
            ));
        }
        if layer.appear_at < 0.0 {
            return Err(PerformError::invalid_definition(
                name,
                format!("子图层 '{}' 的 appear_at 不能为负", layer.name),
            ));
        }
    }

    let opacity = resolve_opacity(def)?;

    let total_duration = match opacity {
        ResolvedOpacity::GroupFade {
            fade_start,
            fade_out,
        } => fade_start + fade_out,
        _ => def
            .timeline
            .duration
            .ok_or_else(|| PerformError::invalid_definition(name, "缺少 duration"))?,
    };
    ensure_positive(name, "duration", total_duration)?;

    let motion = def.timeline.motion;
    if let Some(m) = motion
        && !m.distance.is_finite()
    {
        return Err(PerformError::invalid_definition(name, "motion.distance 非有限"));
    }

    // 阶段边界必须单调不减且不超过结束时刻
    let boundaries = def.timeline.rule_boundaries(&def.layers);
    if let Some(early) = boundaries.iter().find(|b| b.at < 0.0) {
        return Err(PerformError::invalid_definition(
            name,
            format!("阶段边界 {} 早于表演开始: {}", early.name, early.at),
        ));
    }
    if let Some(pair) = boundaries.windows(2).find(|w| w[0].at > w[1].at) {
        return Err(PerformError::invalid_definition(
            name,
            format!(
                "阶段边界倒序: {}({}) > {}({})",
                pair[0].name, pair[0].at, pair[1].name, pair[1].at
            ),
        ));
    }
    if let Some(late) = def.layers.iter().find(|l| l.appear_at > total_duration) {
        return Err(PerformError::invalid_definition(
            name,
            format!("子图层 '{}' 在表演结束后才出现", late.name),
        ));
    }

    let anchor = screen.point_at(def.anchor);
    if !anchor.is_finite() {
        return Err(PerformError::invalid_definition(name, "锚点非有限"));
    }

    Ok(ResolvedPerform {
        name: def.name.clone(),
        ticker_key: def.ticker_key.clone(),
        layer: def.layer,
        anchor,
        layers: def.layers.clone(),
        total_duration,
        opacity,
        motion,
        hide_on_complete: def.hide_on_complete,
    })
}

fn resolve_opacity(def: &EffectDefinition) -> PerformResult<ResolvedOpacity> {
    let name = def.name.as_str();
    let rule = &def.timeline.opacity;

    if matches!(rule, OpacityRule::HoldThenFade { .. }) && def.timeline.duration.is_some() {
        return Err(PerformError::invalid_definition(
            name,
            "hold_then_fade 的时长由图层推导，不能显式指定 duration",
        ));
    }

    Ok(match *rule {
        OpacityRule::Constant => ResolvedOpacity::Constant,
        OpacityRule::Blink { show, hide } => {
            ensure_positive(name, "blink.show", show)?;
            ensure_positive(name, "blink.hide", hide)?;
            ResolvedOpacity::Blink {
                show_end: show,
                hide_end: show + hide,
            }
        }
        OpacityRule::TrailingFade { fade_out } => {
            ensure_positive(name, "fade_out", fade_out)?;
            ResolvedOpacity::TrailingFade { fade_out }
        }
        OpacityRule::ProgressFade { start } => {
            if !(0.0..1.0).contains(&start) {
                return Err(PerformError::invalid_definition(
                    name,
                    format!("progress_fade.start 必须在 [0, 1) 内: {start}"),
                ));
            }
            ResolvedOpacity::ProgressFade { start }
        }
        OpacityRule::HoldThenFade { hold, fade_out } => {
            if !hold.is_finite() || hold < 0.0 {
                return Err(PerformError::invalid_duration(name, "hold", hold));
            }
            ensure_positive(name, "fade_out", fade_out)?;
            ResolvedOpacity::GroupFade {
                fade_start: last_appearance(&def.layers) + hold,
                fade_out,
            }
        }
    })
}

fn ensure_positive(name: &str, field: &str, value: f32) -> PerformResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PerformError::invalid_duration(name, field, value))
    }
}
