//! # Builtin 模块
//!
//! 内置表情表演定义。
//!
//! 所有内置表演都挂在前景特效层，纹理位于 `./game/tex/`。
//! 锚点是固定的屏幕比例（以左上角为原点，x 越大越靠右，y 越大越靠下）。

use crate::definition::{
    Axis, EffectDefinition, LayerChoice, Motion, OpacityRule, Timeline, VisualLayer,
};
use crate::easing::EasingFunction;
use crate::geometry::AnchorRatio;

/// 纹理目录
pub const TEXTURE_DIR: &str = "./game/tex";

/// 表情默认时长（秒）
pub const EMOTE_DURATION: f32 = 1.5;
/// 末尾淡出时长（秒）
pub const FADE_OUT: f32 = 0.25;

/// 通用锚点
const DEFAULT_ANCHOR: AnchorRatio = AnchorRatio::new(0.4, 0.25);

fn tex(file: &str) -> String {
    format!("{TEXTURE_DIR}/{file}")
}

/// 全部内置表演
pub fn all() -> Vec<EffectDefinition> {
    vec![
        en_answer(),
        en_bubble_omit(),
        en_bubble_suki(),
        en_hmm(),
        en_sweat(),
    ]
}

/// answer：单图层，先闪一下（显示 0.1s → 隐藏 0.1s），随后保持到 1.5s
pub fn en_answer() -> EffectDefinition {
    EffectDefinition {
        name: "enAnswer".to_string(),
        ticker_key: "en-answer-foreground-ticker".to_string(),
        layer: LayerChoice::Foreground,
        anchor: DEFAULT_ANCHOR,
        layers: vec![VisualLayer::new("main", tex("en_answer.png"))],
        timeline: Timeline {
            duration: Some(EMOTE_DURATION),
            opacity: OpacityRule::Blink {
                show: 0.1,
                hide: 0.1,
            },
            motion: None,
        },
        hide_on_complete: false,
    }
}

/// 省略号气泡：气泡 + A/B/C 三个点（同一张图），间隔 0.45s 依次出现，
/// 全部出现后保持 1s，再整体淡出
pub fn en_bubble_omit() -> EffectDefinition {
    const DOT_OFFSET: f32 = 40.0;
    const APPEAR_INTERVAL: f32 = 0.45;

    let dot = tex("en_omit.png");
    EffectDefinition {
        name: "enBubbleOmit".to_string(),
        ticker_key: "omit-foreground-ticker".to_string(),
        layer: LayerChoice::Foreground,
        anchor: DEFAULT_ANCHOR,
        layers: vec![
            VisualLayer::new("bubble", tex("Bubble.png")),
            VisualLayer::new("dot-a", dot.clone()).with_offset(-DOT_OFFSET, 0.0),
            VisualLayer::new("dot-b", dot.clone()).with_appear_at(APPEAR_INTERVAL),
            VisualLayer::new("dot-c", dot)
                .with_offset(DOT_OFFSET, 0.0)
                .with_appear_at(APPEAR_INTERVAL * 2.0),
        ],
        timeline: Timeline {
            duration: None,
            opacity: OpacityRule::HoldThenFade {
                hold: 1.0,
                fade_out: FADE_OUT,
            },
            motion: None,
        },
        hide_on_complete: true,
    }
}

/// suki 气泡：气泡 + 中间图，1.5s，末尾淡出
pub fn en_bubble_suki() -> EffectDefinition {
    EffectDefinition {
        name: "enBubbleSuki".to_string(),
        ticker_key: "en-bubble-suki-foreground-ticker".to_string(),
        layer: LayerChoice::Foreground,
        anchor: DEFAULT_ANCHOR,
        layers: vec![
            VisualLayer::new("bubble", tex("Bubble.png")),
            VisualLayer::new("center", tex("en_suki.png")),
        ],
        timeline: Timeline {
            duration: Some(EMOTE_DURATION),
            opacity: OpacityRule::TrailingFade { fade_out: FADE_OUT },
            motion: None,
        },
        hide_on_complete: false,
    }
}

/// 嗯哼：出现后向左移动 65px（三次缓出），进度过 75% 后淡出
pub fn en_hmm() -> EffectDefinition {
    EffectDefinition {
        name: "enHmm".to_string(),
        ticker_key: "en-hmm-foreground-ticker".to_string(),
        layer: LayerChoice::Foreground,
        anchor: AnchorRatio::new(0.45, 0.25),
        layers: vec![VisualLayer::new("main", tex("en_hmm.png"))],
        timeline: Timeline {
            duration: Some(EMOTE_DURATION),
            opacity: OpacityRule::ProgressFade { start: 0.75 },
            motion: Some(Motion {
                axis: Axis::X,
                distance: 65.0,
                easing: EasingFunction::EaseOutCubic,
            }),
        },
        hide_on_complete: false,
    }
}

/// sweat：单图层，1.5s，末尾淡出，结束时隐藏容器
pub fn en_sweat() -> EffectDefinition {
    EffectDefinition {
        name: "enSweat".to_string(),
        ticker_key: "en-sweat-foreground-ticker".to_string(),
        layer: LayerChoice::Foreground,
        anchor: AnchorRatio::new(0.425, 0.25),
        layers: vec![VisualLayer::new("main", tex("en_sweat.png"))],
        timeline: Timeline {
            duration: Some(EMOTE_DURATION),
            opacity: OpacityRule::TrailingFade { fade_out: FADE_OUT },
            motion: None,
        },
        hide_on_complete: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenGeometry;
    use crate::kernel::compute_visual_state;
    use crate::resolver::resolve;

    fn opacities(def: &EffectDefinition, t: f32) -> Vec<f32> {
        let p = resolve(def, &ScreenGeometry::default()).unwrap();
        compute_visual_state(t, &p).iter().map(|s| s.opacity).collect()
    }

    #[test]
    fn test_all_builtins_resolve() {
        for def in all() {
            assert!(resolve(&def, &ScreenGeometry::default()).is_ok(), "{}", def.name);
        }
    }

    #[test]
    fn test_unique_names_and_keys() {
        let defs = all();
        let mut names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        let mut keys: Vec<&str> = defs.iter().map(|d| d.ticker_key.as_str()).collect();
        names.sort();
        names.dedup();
        keys.sort();
        keys.dedup();
        assert_eq!(names.len(), defs.len());
        assert_eq!(keys.len(), defs.len());
    }

    #[test]
    fn test_omit_staggered_reveal() {
        let def = en_bubble_omit();
        // [bubble, A, B, C]
        assert_eq!(opacities(&def, 0.5), vec![1.0, 1.0, 1.0, 0.0]);
        assert_eq!(opacities(&def, 1.0), vec![1.0, 1.0, 1.0, 1.0]);
        // 保持期
        assert_eq!(opacities(&def, 1.8), vec![1.0, 1.0, 1.0, 1.0]);
        // 整体淡出中段
        let mid = opacities(&def, 2.025);
        assert!(mid.iter().all(|o| (o - 0.5).abs() < 1e-3), "{mid:?}");
        assert_eq!(opacities(&def, 2.2), vec![0.0; 4]);
    }

    #[test]
    fn test_omit_dot_positions() {
        let p = resolve(&en_bubble_omit(), &ScreenGeometry::new(1000.0, 1000.0)).unwrap();
        let xs: Vec<f32> = compute_visual_state(0.0, &p)
            .iter()
            .map(|s| s.position.x)
            .collect();
        assert_eq!(xs, vec![400.0, 360.0, 400.0, 440.0]);
    }

    #[test]
    fn test_hmm_anchor() {
        let p = resolve(&en_hmm(), &ScreenGeometry::default()).unwrap();
        assert_eq!(p.anchor.x, 2560.0 * 0.45);
        assert_eq!(p.anchor.y, 1440.0 * 0.25);
    }
}
