//! # Easing 模块
//!
//! 位移阶段使用的缓动函数。

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出：`1 - (1 - t)^3`
    #[default]
    EaseOutCubic,
    /// 三次缓入缓出
    EaseInOutCubic,
    /// 正弦缓出
    EaseOutSine,
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// `t` 先被限制到 `[0, 1]`，返回值同样落在 `[0, 1]`。
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOutCubic => ease_out_cubic(t),
            EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseOutSine => (t * PI / 2.0).sin(),
        }
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let u = 1.0 - t;
    1.0 - u * u * u
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(0.5), 0.5);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        let easing = EasingFunction::EaseOutCubic;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
        // 先快后慢：中点已经过半
        assert!((easing.apply(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_clamp() {
        let easing = EasingFunction::EaseOutCubic;
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_monotonic() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::EaseInQuad,
            EasingFunction::EaseOutQuad,
            EasingFunction::EaseInCubic,
            EasingFunction::EaseOutCubic,
            EasingFunction::EaseInOutCubic,
            EasingFunction::EaseOutSine,
        ] {
            let mut last = easing.apply(0.0);
            for i in 1..=100 {
                let v = easing.apply(i as f32 / 100.0);
                assert!(v + 1e-6 >= last, "{easing:?} 在 {i} 处非单调");
                last = v;
            }
        }
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&EasingFunction::EaseOutCubic).unwrap();
        assert_eq!(json, "\"ease_out_cubic\"");
    }
}
