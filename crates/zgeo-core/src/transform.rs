//! 三角形的刚体/相似变换
//!
//! 以重心为基准，固定顺序：翻转 → 缩放 → 旋转 → 平移到目标重心。

use crate::math::{BoundingBox2, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// 翻转方式（在重心坐标系中取反一个轴）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flip {
    #[default]
    None,
    /// 左右翻转（x 取反）
    Horizontal,
    /// 上下翻转（y 取反）
    Vertical,
}

/// 变换参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleTransform {
    pub scale: f64,
    /// 旋转角（度，逆时针）
    pub rotation_deg: f64,
    pub flip: Flip,
}

impl TriangleTransform {
    pub fn new(scale: f64, rotation_deg: f64, flip: Flip) -> Self {
        Self {
            scale,
            rotation_deg,
            flip,
        }
    }

    /// 全等放置：缩放固定为 1
    pub fn congruent(rotation_deg: f64, flip: Flip) -> Self {
        Self::new(1.0, rotation_deg, flip)
    }

    /// 以重心为原点变换单个偏移向量
    pub fn apply(&self, offset: Vector2) -> Vector2 {
        let flipped = match self.flip {
            Flip::None => offset,
            Flip::Horizontal => Vector2::new(-offset.x, offset.y),
            Flip::Vertical => Vector2::new(offset.x, -offset.y),
        };
        let scaled = flipped * self.scale;
        let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
        Vector2::new(
            scaled.x * cos - scaled.y * sin,
            scaled.x * sin + scaled.y * cos,
        )
    }
}

impl Default for TriangleTransform {
    fn default() -> Self {
        Self::new(1.0, 0.0, Flip::None)
    }
}

/// 三角形重心
pub fn get_triangle_centroid(points: &[Point2; 3]) -> Point2 {
    Point2::new(
        (points[0].x + points[1].x + points[2].x) / 3.0,
        (points[0].y + points[1].y + points[2].y) / 3.0,
    )
}

/// 三角形包围盒
pub fn get_triangle_bounds(points: &[Point2; 3]) -> BoundingBox2 {
    BoundingBox2::from_points(points.iter().copied())
}

/// 变换三角形，使结果的重心落在 `target_center`
pub fn transform_triangle(
    points: &[Point2; 3],
    transform: &TriangleTransform,
    target_center: Point2,
) -> [Point2; 3] {
    let centroid = get_triangle_centroid(points);
    points.map(|p| target_center + transform.apply(p - centroid))
}
