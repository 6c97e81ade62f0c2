//! 基础数学类型
//!
//! 基于 nalgebra 的二维点/向量别名，以及包围盒和少量角度工具。

use serde::{Deserialize, Serialize};

/// 二维点
pub type Point2 = nalgebra::Point2<f64>;

/// 二维向量
pub type Vector2 = nalgebra::Vector2<f64>;

/// 默认几何容差（退化判定）
pub const EPSILON: f64 = 1e-10;

/// 两点距离
#[inline]
pub fn distance(a: &Point2, b: &Point2) -> f64 {
    (b - a).norm()
}

/// 向量逆时针旋转90°
#[inline]
pub fn perp(v: &Vector2) -> Vector2 {
    Vector2::new(-v.y, v.x)
}

/// 二维叉积（z分量）
#[inline]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// 归一化角度到 [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let a = angle % two_pi;
    let r = if a < 0.0 { a + two_pi } else { a };
    // 极小的负角加 2π 会舍入成 2π
    if r >= two_pi {
        0.0
    } else {
        r
    }
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self {
            min: Point2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Point2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    /// 空包围盒（min > max），任何 expand 之后才有效
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn contains(&self, point: &Point2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// 以点为中心、半边长为 `half` 的正方形
    pub fn around(center: Point2, half: f64) -> Self {
        Self::new(
            Point2::new(center.x - half, center.y - half),
            Point2::new(center.x + half, center.y + half),
        )
    }
}
