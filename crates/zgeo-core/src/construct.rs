//! 构造算法
//!
//! 纯几何函数：中点、垂足、平行偏移点、内心/外心、切点、直角判定。
//! 退化输入返回约定的回退值（起点、重心、零半径或 None），从不 panic。

use crate::math::{cross, normalize_angle, perp, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};

/// 直角判定的默认容差（度）
pub const RIGHT_ANGLE_TOLERANCE_DEG: f64 = 1.0;

/// 切点判定：外部点必须在圆外至少这么远
const TANGENT_EPSILON: f64 = 1e-9;

/// 三角形的心及对应半径
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleCenter {
    pub point: Point2,
    pub radius: f64,
}

/// 中点
pub fn midpoint(a: &Point2, b: &Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// 点在过 a、b 的无限直线上的垂足
///
/// 直线退化（a、b 重合）时返回 a。
pub fn get_perpendicular_foot(point: &Point2, a: &Point2, b: &Point2) -> Point2 {
    let v = b - a;
    let len_sq = v.dot(&v);
    if len_sq < EPSILON * EPSILON {
        return *a;
    }
    let t = (point - a).dot(&v) / len_sq;
    a + v * t
}

/// 沿参考直线方向偏移 `distance` 的点，用来给平行线补第二个定义点
pub fn get_parallel_point(source: &Point2, a: &Point2, b: &Point2, distance: f64) -> Point2 {
    source + unit_or_x(&(b - a)) * distance
}

/// 沿参考直线法向偏移的点，用来给垂线补第二个定义点
pub fn get_perpendicular_point(source: &Point2, a: &Point2, b: &Point2, distance: f64) -> Point2 {
    source + perp(&unit_or_x(&(b - a))) * distance
}

fn unit_or_x(v: &Vector2) -> Vector2 {
    let len = v.norm();
    if len < EPSILON {
        Vector2::new(1.0, 0.0)
    } else {
        v / len
    }
}

/// 内心与内切圆半径
///
/// 顶点按对边长度加权平均；周长接近零时回退到 p1、半径 0。
pub fn get_incenter(p1: &Point2, p2: &Point2, p3: &Point2) -> TriangleCenter {
    let a = (p3 - p2).norm();
    let b = (p1 - p3).norm();
    let c = (p2 - p1).norm();
    let perimeter = a + b + c;
    if perimeter < EPSILON {
        return TriangleCenter {
            point: *p1,
            radius: 0.0,
        };
    }

    let x = (a * p1.x + b * p2.x + c * p3.x) / perimeter;
    let y = (a * p1.y + b * p2.y + c * p3.y) / perimeter;
    let area = triangle_area(p1, p2, p3);

    TriangleCenter {
        point: Point2::new(x, y),
        radius: 2.0 * area / perimeter,
    }
}

/// 外心与外接圆半径
///
/// 行列式闭式解；三点近似共线时回退到重心、半径 0。
pub fn get_circumcenter(p1: &Point2, p2: &Point2, p3: &Point2) -> TriangleCenter {
    let d = 2.0 * (p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y));

    if d.abs() < EPSILON {
        return TriangleCenter {
            point: Point2::new(
                (p1.x + p2.x + p3.x) / 3.0,
                (p1.y + p2.y + p3.y) / 3.0,
            ),
            radius: 0.0,
        };
    }

    let s1 = p1.x * p1.x + p1.y * p1.y;
    let s2 = p2.x * p2.x + p2.y * p2.y;
    let s3 = p3.x * p3.x + p3.y * p3.y;

    let ux = (s1 * (p2.y - p3.y) + s2 * (p3.y - p1.y) + s3 * (p1.y - p2.y)) / d;
    let uy = (s1 * (p3.x - p2.x) + s2 * (p1.x - p3.x) + s3 * (p2.x - p1.x)) / d;

    let center = Point2::new(ux, uy);
    TriangleCenter {
        point: center,
        radius: (p1 - center).norm(),
    }
}

/// 三角形面积（非负）
pub fn triangle_area(p1: &Point2, p2: &Point2, p3: &Point2) -> f64 {
    cross(&(p2 - p1), &(p3 - p1)).abs() / 2.0
}

/// 从外部点到圆的两个切点
///
/// `a = r²/d`，`h = √(r² − a²)`；外部点不严格在圆外时返回 None。
pub fn get_tangent_points(center: &Point2, radius: f64, external: &Point2) -> Option<[Point2; 2]> {
    let v = external - center;
    let d = v.norm();
    if !(radius > 0.0) || d <= radius + TANGENT_EPSILON {
        return None;
    }

    let a = radius * radius / d;
    let h = (radius * radius - a * a).max(0.0).sqrt();
    let u = v / d;
    let base = center + u * a;
    let n = perp(&u);

    Some([base + n * h, base - n * h])
}

/// 角 p1-vertex-p2 的逆时针扫角（弧度）与第一条边方向角
///
/// 任一边退化时返回 None。
pub fn angle_between(p1: &Point2, vertex: &Point2, p2: &Point2) -> Option<(f64, f64)> {
    let v1 = p1 - vertex;
    let v2 = p2 - vertex;
    if v1.norm() < EPSILON || v2.norm() < EPSILON {
        return None;
    }
    let start = v1.y.atan2(v1.x);
    let end = v2.y.atan2(v2.x);
    Some((start, normalize_angle(end - start)))
}

/// 直角判定（考虑 90°/270° 两种朝向）
pub fn is_right_angle(degrees: f64, tolerance_deg: f64) -> bool {
    let d = degrees.rem_euclid(360.0);
    (d - 90.0).abs() <= tolerance_deg || (d - 270.0).abs() <= tolerance_deg
}
