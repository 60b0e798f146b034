//! 数学基础类型
//!
//! 基于 nalgebra 提供的二维向量别名，以及立绘坐标计算所需的分量运算扩展。
//!
//! 所有坐标均为像素单位、Y 轴向上（第 0 行是图像底边）。

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// 2D向量类型
pub type Vector2 = na::Vector2<f64>;

/// 数值容差，用于几何比较
pub const EPSILON: f64 = 1e-6;

/// 判断两个浮点数是否近似相等
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// 判断两个2D向量是否近似相等
#[inline]
pub fn vectors_approx_eq(a: &Vector2, b: &Vector2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

/// 分量运算扩展
///
/// nalgebra 已提供 `+ - norm sum component_mul component_div inf sup`，
/// 这里补齐取整、乘积、旋转等立绘计算中频繁出现的操作。
pub trait Vector2Ext {
    /// 两个分量相同的向量
    fn splat(value: f64) -> Self;

    /// 分量乘积（面积）
    fn prod(&self) -> f64;

    /// 分量四舍五入（远离零）
    fn rounded(&self) -> Self;

    /// 分量向下取整
    fn floored(&self) -> Self;

    /// 分量向上取整
    fn ceiled(&self) -> Self;

    /// 绕原点逆时针旋转（弧度）
    fn rotated(&self, rad: f64) -> Self;

    /// 二维叉积（z 分量）
    ///
    /// 不叫 `cross`：nalgebra 的固有 `cross` 是三维叉积。
    fn cross2(&self, other: &Self) -> f64;

    /// 每个分量都不大于 `other`
    fn all_le(&self, other: &Self) -> bool;

    /// 每个分量都不小于 `other`
    fn all_ge(&self, other: &Self) -> bool;

    /// 两个分量都是有限值
    fn is_finite_all(&self) -> bool;
}

impl Vector2Ext for Vector2 {
    fn splat(value: f64) -> Self {
        Vector2::new(value, value)
    }

    fn prod(&self) -> f64 {
        self.x * self.y
    }

    fn rounded(&self) -> Self {
        self.map(f64::round)
    }

    fn floored(&self) -> Self {
        self.map(f64::floor)
    }

    fn ceiled(&self) -> Self {
        self.map(f64::ceil)
    }

    fn rotated(&self, rad: f64) -> Self {
        let (sin, cos) = rad.sin_cos();
        Vector2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    fn cross2(&self, other: &Self) -> f64 {
        self.perp(other)
    }

    fn all_le(&self, other: &Self) -> bool {
        self.x <= other.x && self.y <= other.y
    }

    fn all_ge(&self, other: &Self) -> bool {
        self.x >= other.x && self.y >= other.y
    }

    fn is_finite_all(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 2D包围盒
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Vector2,
    pub max: Vector2,
}

impl BoundingBox2 {
    /// 创建新的包围盒
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// 合并两个包围盒
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// 检查是否完整包含另一个包围盒
    pub fn contains_box(&self, other: &Self) -> bool {
        self.min.all_le(&other.min) && self.max.all_ge(&other.max)
    }

    /// 尺寸
    pub fn size(&self) -> Vector2 {
        self.max - self.min
    }
}

/// 整数像素矩形（左下角 + 尺寸，半开区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// 由两个角点构造，角点顺序任意
    pub fn from_corners(a: (i64, i64), b: (i64, i64)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32)
    }

    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    pub fn top(&self) -> i64 {
        self.y + self.height as i64
    }

    /// 零面积
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 裁剪到 `[0, width) x [0, height)` 画布内
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x0 = self.x.clamp(0, width as i64);
        let y0 = self.y.clamp(0, height as i64);
        let x1 = self.right().clamp(0, width as i64);
        let y1 = self.top().clamp(0, height as i64);
        Self::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox2::new(Vector2::zeros(), Vector2::new(10.0, 5.0))
            .union(&BoundingBox2::new(Vector2::new(-5.0, 2.0), Vector2::new(0.0, 8.0)));

        assert!(approx_eq(bbox.min.x, -5.0));
        assert!(approx_eq(bbox.min.y, 0.0));
        assert!(approx_eq(bbox.max.x, 10.0));
        assert!(approx_eq(bbox.max.y, 8.0));
        assert!(bbox.contains_box(&BoundingBox2::new(
            Vector2::new(0.0, 1.0),
            Vector2::new(2.0, 4.0)
        )));
        assert!(!bbox.contains_box(&BoundingBox2::new(
            Vector2::new(0.0, 1.0),
            Vector2::new(20.0, 4.0)
        )));
    }

    #[test]
    fn test_vector_ext() {
        let v = Vector2::new(2.5, -1.5);
        assert!(vectors_approx_eq(&v.rounded(), &Vector2::new(3.0, -2.0)));
        assert!(vectors_approx_eq(&v.floored(), &Vector2::new(2.0, -2.0)));
        assert!(vectors_approx_eq(&v.ceiled(), &Vector2::new(3.0, -1.0)));
        assert!(approx_eq(v.prod(), -3.75));
        assert!(approx_eq(v.sum(), 1.0));

        let r = Vector2::new(1.0, 0.0).rotated(std::f64::consts::FRAC_PI_2);
        assert!(vectors_approx_eq(&r, &Vector2::new(0.0, 1.0)));

        assert!(approx_eq(Vector2::new(1.0, 0.0).cross2(&Vector2::new(0.0, 1.0)), 1.0));
        assert!(approx_eq(Vector2::new(0.0, 1.0).cross2(&Vector2::new(1.0, 0.0)), -1.0));
        assert!(approx_eq(Vector2::new(3.0, 4.0).norm(), 5.0));
        assert!(!Vector2::new(f64::NAN, 0.0).is_finite_all());
    }

    #[test]
    fn test_pixel_rect_clamp() {
        let rect = PixelRect::from_corners((120, -10), (-5, 30));
        assert_eq!(rect, PixelRect::new(-5, -10, 125, 40));

        let clamped = rect.clamp_to(100, 20);
        assert_eq!(clamped, PixelRect::new(0, 0, 100, 20));
        assert!(PixelRect::new(3, 3, 0, 7).is_empty());
    }
}
