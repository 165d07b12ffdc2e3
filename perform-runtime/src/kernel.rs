//! # Kernel 模块
//!
//! 阶段计算内核：给定已解析的表演参数和经过时间，计算每个子图层的透明度和位置。
//!
//! 全部是纯函数，同样的输入永远得到同样的输出；实例更新逻辑只负责累加时间
//! 并把结果写回节点。

use serde::Serialize;

use crate::definition::Axis;
use crate::geometry::Vec2;
use crate::resolver::{ResolvedOpacity, ResolvedPerform};

/// 单个子图层在某一时刻的视觉状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerState {
    /// 透明度 (0.0 - 1.0)
    pub opacity: f32,
    /// 位置（图层局部像素坐标）
    pub position: Vec2,
}

/// 线性进度，限制在 `[0, 1]`
///
/// `duration` 在构造阶段已保证为正。
pub fn progress(elapsed: f32, duration: f32) -> f32 {
    (elapsed / duration).clamp(0.0, 1.0)
}

/// 闪烁：`[0, show_end)` 显示，`[show_end, hide_end)` 隐藏，之后显示
pub fn blink_opacity(elapsed: f32, show_end: f32, hide_end: f32) -> f32 {
    if elapsed < show_end {
        1.0
    } else if elapsed < hide_end {
        0.0
    } else {
        1.0
    }
}

/// 分段出现：达到阈值后透明度从 0 跳到 1
pub fn staggered_opacity(elapsed: f32, appear_at: f32) -> f32 {
    if elapsed >= appear_at { 1.0 } else { 0.0 }
}

/// 末尾淡出：最后 `fade_out` 秒内按剩余时间 1 → 0
pub fn trailing_fade_opacity(elapsed: f32, duration: f32, fade_out: f32) -> f32 {
    let remaining = duration - elapsed;
    if remaining <= fade_out {
        (remaining / fade_out).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// 按进度淡出：进度达到 `start` 后线性 1 → 0
pub fn progress_fade_opacity(p: f32, start: f32) -> f32 {
    if p < start {
        1.0
    } else {
        1.0 - ((p - start) / (1.0 - start)).clamp(0.0, 1.0)
    }
}

/// 整组淡出：以组内剩余时间 `(fade_start + fade_out) - elapsed` 计算
pub fn group_fade_opacity(elapsed: f32, fade_start: f32, fade_out: f32) -> f32 {
    if elapsed < fade_start {
        1.0
    } else {
        let remaining = (fade_start + fade_out) - elapsed;
        (remaining / fade_out).clamp(0.0, 1.0)
    }
}

/// 缓动位移：返回沿轴的偏移量 `-distance * ease(p)`
pub fn eased_offset(p: f32, distance: f32, ease: impl Fn(f32) -> f32) -> f32 {
    -distance * ease(p)
}

/// 规则透明度（不含分段出现与终止判断）
fn rule_opacity(elapsed: f32, perform: &ResolvedPerform) -> f32 {
    let duration = perform.total_duration;
    match perform.opacity {
        ResolvedOpacity::Constant => 1.0,
        ResolvedOpacity::Blink { show_end, hide_end } => {
            blink_opacity(elapsed, show_end, hide_end)
        }
        ResolvedOpacity::TrailingFade { fade_out } => {
            trailing_fade_opacity(elapsed, duration, fade_out)
        }
        ResolvedOpacity::ProgressFade { start } => {
            progress_fade_opacity(progress(elapsed, duration), start)
        }
        ResolvedOpacity::GroupFade {
            fade_start,
            fade_out,
        } => group_fade_opacity(elapsed, fade_start, fade_out),
    }
}

/// 位移偏移（所有子图层共享）
fn motion_offset(elapsed: f32, perform: &ResolvedPerform) -> Vec2 {
    let Some(motion) = perform.motion else {
        return Vec2::zero();
    };
    let p = progress(elapsed, perform.total_duration);
    let offset = eased_offset(p, motion.distance, |t| motion.easing.apply(t));
    match motion.axis {
        Axis::X => Vec2::new(offset, 0.0),
        Axis::Y => Vec2::new(0.0, offset),
    }
}

/// 表演是否已到达终点
pub fn is_finished(elapsed: f32, perform: &ResolvedPerform) -> bool {
    progress(elapsed, perform.total_duration) >= 1.0
}

/// 计算全部子图层的视觉状态，顺序与 `perform.layers` 一致
///
/// `elapsed >= total_duration` 时所有透明度恒为 0，这一判断优先于所有阶段规则；
/// 位置仍按（已限制的）进度计算，因此终点位移会被如实报告。
pub fn compute_visual_state(elapsed: f32, perform: &ResolvedPerform) -> Vec<LayerState> {
    let finished = is_finished(elapsed, perform);
    let rule = rule_opacity(elapsed, perform);
    let shift = motion_offset(elapsed, perform);

    perform
        .layers
        .iter()
        .map(|layer| {
            let opacity = if finished {
                0.0
            } else {
                staggered_opacity(elapsed, layer.appear_at) * rule
            };
            LayerState {
                opacity,
                position: perform.anchor + layer.offset + shift,
            }
        })
        .collect()
}
