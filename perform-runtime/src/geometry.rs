//! # Geometry 模块
//!
//! 二维向量与屏幕尺寸常量。

use serde::{Deserialize, Serialize};

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// 创建新的向量
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 零向量
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// 线性插值
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// 两个分量是否都是有限值
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for (f32, f32) {
    fn from(v: Vec2) -> Self {
        (v.x, v.y)
    }
}

/// 锚点比例（相对屏幕宽高的比例）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorRatio {
    pub x: f32,
    pub y: f32,
}

impl AnchorRatio {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 屏幕尺寸常量
///
/// 只读，用于把锚点比例换算为像素坐标（以左上角为原点）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// 舞台宽度（像素）
    #[serde(default = "default_width")]
    pub width: f32,
    /// 舞台高度（像素）
    #[serde(default = "default_height")]
    pub height: f32,
}

fn default_width() -> f32 {
    2560.0
}

fn default_height() -> f32 {
    1440.0
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl ScreenGeometry {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// 按比例计算屏幕上的点
    pub fn point_at(&self, ratio: AnchorRatio) -> Vec2 {
        Vec2::new(self.width * ratio.x, self.height * ratio.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_at() {
        let screen = ScreenGeometry::new(2560.0, 1440.0);
        let p = screen.point_at(AnchorRatio::new(0.4, 0.25));
        assert!((p.x - 1024.0).abs() < 1e-3);
        assert!((p.y - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_vec2_ops() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, 6.0);
        assert_eq!(a + b, Vec2::new(4.0, 8.0));
        assert_eq!(a.lerp(b, 0.5), Vec2::new(2.0, 4.0));
        assert_eq!(<(f32, f32)>::from(a), (1.0, 2.0));
    }

    #[test]
    fn test_screen_defaults_from_empty_json() {
        let screen: ScreenGeometry = serde_json::from_str("{}").unwrap();
        assert_eq!(screen, ScreenGeometry::default());
    }
}
