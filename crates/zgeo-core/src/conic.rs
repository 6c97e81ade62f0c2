//! 圆锥曲线生成器
//!
//! 由几何定义或方程构造抛物线/双曲线/椭圆，并按参数采样。
//! 所有采样点都由标准参数式直接求出，因此满足曲线的隐式方程。
//! 退化定义一律返回空结果或 None。

use crate::construct::{get_perpendicular_foot, midpoint};
use crate::geometry::{Branch, Ellipse, Hyperbola, HyperbolaOrientation, Parabola};
use crate::math::{cross, perp, BoundingBox2, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};

/// 双曲线两支的采样结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperbolaSamples {
    /// 正方向分支（水平时为右支，竖直时为上支）
    pub branch1: Vec<Point2>,
    /// 负方向分支
    pub branch2: Vec<Point2>,
}

impl HyperbolaSamples {
    pub fn is_empty(&self) -> bool {
        self.branch1.is_empty() && self.branch2.is_empty()
    }

    pub fn branch(&self, branch: Branch) -> &[Point2] {
        match branch {
            Branch::Primary => &self.branch1,
            Branch::Secondary => &self.branch2,
        }
    }
}

/// 在 [t_min, t_max] 上均匀取 `samples` 个参数（含两端）
fn sample_params(t_min: f64, t_max: f64, samples: usize) -> impl Iterator<Item = f64> {
    let n = samples.max(2);
    let step = (t_max - t_min) / (n - 1) as f64;
    (0..n).map(move |i| t_min + step * i as f64)
}

fn range_is_valid(t_min: f64, t_max: f64, samples: usize) -> bool {
    samples > 0 && t_min.is_finite() && t_max.is_finite() && t_min <= t_max
}

/// 由顶点和焦点构造抛物线；两点重合时返回 None
pub fn parabola_from_vertex_focus(vertex: &Point2, focus: &Point2) -> Option<Parabola> {
    let axis = focus - vertex;
    let p = axis.norm();
    if p < EPSILON || !p.is_finite() {
        return None;
    }
    Some(Parabola::new(*vertex, p, axis.y.atan2(axis.x)))
}

/// 由焦点和准线（两点）构造抛物线
///
/// 准线长度为零或焦点在准线上时返回 None。
pub fn parabola_from_focus_directrix(
    focus: &Point2,
    d1: &Point2,
    d2: &Point2,
) -> Option<Parabola> {
    let dir = d2 - d1;
    let len = dir.norm();
    if len < EPSILON {
        return None;
    }
    let foot = get_perpendicular_foot(focus, d1, d2);
    let to_focus = focus - foot;
    let d = to_focus.norm();
    if d < EPSILON {
        return None;
    }
    Some(Parabola::new(
        midpoint(focus, &foot),
        d / 2.0,
        to_focus.y.atan2(to_focus.x),
    ))
}

/// y = a(x-h)² + k
pub fn parabola_from_equation(a: f64, h: f64, k: f64) -> Option<Parabola> {
    if a.abs() < EPSILON || !a.is_finite() || !h.is_finite() || !k.is_finite() {
        return None;
    }
    let axis_angle = if a > 0.0 {
        std::f64::consts::FRAC_PI_2
    } else {
        -std::f64::consts::FRAC_PI_2
    };
    Some(Parabola::new(Point2::new(h, k), 1.0 / (4.0 * a.abs()), axis_angle))
}

/// 由两焦点和曲线上一点构造椭圆
///
/// 该点落在焦点连线段上（2a == 2c）时退化，返回 None。
pub fn ellipse_by_foci(f1: &Point2, f2: &Point2, point_on: &Point2) -> Option<Ellipse> {
    let sum = (point_on - f1).norm() + (point_on - f2).norm();
    let a = sum / 2.0;
    let focal = f2 - f1;
    let c = focal.norm() / 2.0;
    let b_sq = a * a - c * c;
    if !(a > EPSILON) || b_sq <= EPSILON * EPSILON || !b_sq.is_finite() {
        return None;
    }
    let rotation = if c < EPSILON { 0.0 } else { focal.y.atan2(focal.x) };
    Some(Ellipse::new(midpoint(f1, f2), a, b_sq.sqrt(), rotation))
}

/// 顶点+焦点抛物线采样
///
/// p = |focus − vertex|，u = (focus − vertex)/p，v ⟂ u，
/// `point = vertex + u·(t²/4p) + v·t`。p ≈ 0 时返回空。
pub fn parabola_points_by_vertex_focus(
    vertex: &Point2,
    focus: &Point2,
    t_min: f64,
    t_max: f64,
    samples: usize,
) -> Vec<Point2> {
    if !range_is_valid(t_min, t_max, samples) {
        return Vec::new();
    }
    match parabola_from_vertex_focus(vertex, focus) {
        Some(parabola) => sample_params(t_min, t_max, samples)
            .map(|t| parabola.point_at(t))
            .collect(),
        None => Vec::new(),
    }
}

/// 焦点+准线抛物线采样
///
/// d 为焦点到准线的有符号距离，n 为准线单位法向（焦点在正侧时 d > 0），
/// 顶点取焦点与其垂足的中点，`point = vertex + n·(t²/2d) + tangent·t`。
pub fn parabola_points_by_focus_directrix(
    focus: &Point2,
    d1: &Point2,
    d2: &Point2,
    t_min: f64,
    t_max: f64,
    samples: usize,
) -> Vec<Point2> {
    if !range_is_valid(t_min, t_max, samples) {
        return Vec::new();
    }
    let dir = d2 - d1;
    let len = dir.norm();
    if len < EPSILON {
        return Vec::new();
    }
    let tangent: Vector2 = dir / len;
    let normal = perp(&tangent);
    let d = cross(&tangent, &(focus - d1));
    if d.abs() < EPSILON {
        return Vec::new();
    }

    let foot = focus - normal * d;
    let vertex = midpoint(focus, &foot);

    sample_params(t_min, t_max, samples)
        .map(|t| vertex + normal * (t * t / (2.0 * d)) + tangent * t)
        .collect()
}

/// 双曲线两支采样，参数 t ∈ [-t_max, t_max]
///
/// 水平：`x = cx ± a·cosh t`，`y = cy + b·sinh t`；竖直时交换 x/y 角色。
pub fn hyperbola_points(hyperbola: &Hyperbola, t_max: f64, samples: usize) -> HyperbolaSamples {
    if hyperbola.is_degenerate() || !t_max.is_finite() || t_max < 0.0 || samples == 0 {
        return HyperbolaSamples::default();
    }
    let branch = |b: Branch| {
        sample_params(-t_max, t_max, samples)
            .map(|t| hyperbola.point_at(t, b))
            .collect::<Vec<_>>()
    };
    HyperbolaSamples {
        branch1: branch(Branch::Primary),
        branch2: branch(Branch::Secondary),
    }
}

/// 覆盖视口所需的最小参数范围 t_max
///
/// 曲线在 |t| 增大时沿两个坐标单调远离中心，只要任一坐标超出视口就不会再回来，
/// 所以取 `acosh(实轴最大偏移/a)` 与 `asinh(虚轴最大偏移/b)` 的较小者。
/// 视口完全落在两支之间时返回 0。
pub fn solve_t_max_for_viewport(hyperbola: &Hyperbola, viewport: &BoundingBox2) -> f64 {
    if hyperbola.is_degenerate() || viewport.is_empty() {
        return 0.0;
    }
    let corners = [
        viewport.min,
        viewport.max,
        Point2::new(viewport.min.x, viewport.max.y),
        Point2::new(viewport.max.x, viewport.min.y),
    ];
    let (mut max_u, mut max_v) = (0.0f64, 0.0f64);
    for corner in &corners {
        let l = hyperbola.to_local(corner);
        max_u = max_u.max(l.x.abs());
        max_v = max_v.max(l.y.abs());
    }
    if !max_u.is_finite() || !max_v.is_finite() || max_u < hyperbola.a {
        return 0.0;
    }

    let t_u = (max_u / hyperbola.a).acosh();
    let t_v = (max_v / hyperbola.b).asinh();
    t_u.min(t_v).max(0.0)
}

/// 由方程参数构造双曲线
pub fn hyperbola_from_equation(
    a: f64,
    b: f64,
    center_x: f64,
    center_y: f64,
    orientation: HyperbolaOrientation,
) -> Option<Hyperbola> {
    let h = Hyperbola::new(Point2::new(center_x, center_y), a, b, orientation);
    (!h.is_degenerate()).then_some(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Line;
    use approx::assert_relative_eq;

    #[test]
    fn test_hyperbola_vertex_at_t0() {
        let h = Hyperbola::new(Point2::origin(), 3.0, 2.0, HyperbolaOrientation::Horizontal);
        // t ∈ {-1, 0, 1}
        let samples = hyperbola_points(&h, 1.0, 3);
        assert_eq!(samples.branch1.len(), 3);
        let p = samples.branch1[1];
        assert_relative_eq!(p.x, 3.0);
        assert_relative_eq!(p.y, 0.0);
        assert_relative_eq!(p.x * p.x / 9.0 - p.y * p.y / 4.0, 1.0);
        assert_relative_eq!(samples.branch2[1].x, -3.0);
    }

    #[test]
    fn test_hyperbola_degenerate_is_empty() {
        for (a, b) in [(0.0, 1.0), (1.0, -1.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            let h = Hyperbola::new(Point2::origin(), a, b, HyperbolaOrientation::Vertical);
            assert!(hyperbola_points(&h, 2.0, 50).is_empty());
            let viewport = BoundingBox2::around(Point2::origin(), 10.0);
            assert_eq!(solve_t_max_for_viewport(&h, &viewport), 0.0);
        }
    }

    #[test]
    fn test_t_max_covers_viewport() {
        let h = Hyperbola::new(Point2::origin(), 1.0, 1.0, HyperbolaOrientation::Horizontal);
        let viewport = BoundingBox2::around(Point2::origin(), 10.0);
        let t_max = solve_t_max_for_viewport(&h, &viewport);
        assert_relative_eq!(t_max, 10.0f64.asinh().min(10.0f64.acosh()), epsilon = 1e-12);

        // 端点刚好到达视口边界
        let end = h.point_at(t_max, Branch::Primary);
        assert!(end.x <= 10.0 + 1e-9 && end.y <= 10.0 + 1e-9);
        assert!((end.x - 10.0).abs() < 1e-9 || (end.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_t_max_viewport_between_branches() {
        let h = Hyperbola::new(Point2::origin(), 5.0, 1.0, HyperbolaOrientation::Horizontal);
        let viewport = BoundingBox2::around(Point2::origin(), 2.0);
        assert_eq!(solve_t_max_for_viewport(&h, &viewport), 0.0);
    }

    #[test]
    fn test_parabola_vertex_focus_degenerate() {
        let v = Point2::new(1.0, 1.0);
        assert!(parabola_points_by_vertex_focus(&v, &v, -5.0, 5.0, 20).is_empty());
        assert!(parabola_points_by_vertex_focus(&v, &Point2::new(1.0, 2.0), 5.0, -5.0, 20).is_empty());
    }

    #[test]
    fn test_parabola_focus_directrix_degenerate() {
        let f = Point2::new(0.0, 0.0);
        let d = Point2::new(3.0, 3.0);
        assert!(parabola_points_by_focus_directrix(&f, &d, &d, -5.0, 5.0, 20).is_empty());
        // 焦点在准线上
        assert!(parabola_points_by_focus_directrix(
            &f,
            &Point2::new(-1.0, 0.0),
            &Point2::new(1.0, 0.0),
            -5.0,
            5.0,
            20
        )
        .is_empty());
    }

    #[test]
    fn test_parabola_focus_directrix_negative_side() {
        // 焦点在准线下方（有符号距离为负）
        let focus = Point2::new(0.0, -2.0);
        let d1 = Point2::new(-1.0, 0.0);
        let d2 = Point2::new(1.0, 0.0);
        let pts = parabola_points_by_focus_directrix(&focus, &d1, &d2, -6.0, 6.0, 25);
        assert_eq!(pts.len(), 25);
        let directrix = Line::infinite(d1, d2);
        for p in pts {
            assert!(p.y <= -1.0 + 1e-12);
            assert_relative_eq!((p - focus).norm(), directrix.distance_to_point(&p), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_parabola_constructions_agree() {
        let focus = Point2::new(2.0, 5.0);
        let d1 = Point2::new(-3.0, 1.0);
        let d2 = Point2::new(4.0, 1.0);
        let from_directrix = parabola_from_focus_directrix(&focus, &d1, &d2).unwrap();
        assert_relative_eq!(from_directrix.vertex.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(from_directrix.vertex.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(from_directrix.focal_length, 2.0, epsilon = 1e-12);

        let from_vertex = parabola_from_vertex_focus(&from_directrix.vertex, &focus).unwrap();
        assert_relative_eq!(from_vertex.axis_angle, from_directrix.axis_angle, epsilon = 1e-12);
    }

    #[test]
    fn test_parabola_from_equation() {
        let p = parabola_from_equation(0.5, 1.0, -2.0).unwrap();
        for x in [-3.0, 0.0, 1.0, 4.5] {
            let y = 0.5 * (x - 1.0) * (x - 1.0) - 2.0;
            assert!(p.implicit(&Point2::new(x, y)).abs() < 1e-9);
        }
        assert!(parabola_from_equation(0.0, 0.0, 0.0).is_none());

        let down = parabola_from_equation(-1.0, 0.0, 0.0).unwrap();
        assert!(down.implicit(&Point2::new(2.0, -4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_ellipse_by_foci() {
        let e = ellipse_by_foci(
            &Point2::new(-4.0, 0.0),
            &Point2::new(4.0, 0.0),
            &Point2::new(0.0, 3.0),
        )
        .unwrap();
        assert_relative_eq!(e.semi_major, 5.0, epsilon = 1e-12);
        assert_relative_eq!(e.semi_minor, 3.0, epsilon = 1e-12);

        // 点在焦点连线段上
        assert!(ellipse_by_foci(
            &Point2::new(-4.0, 0.0),
            &Point2::new(4.0, 0.0),
            &Point2::new(1.0, 0.0)
        )
        .is_none());
    }
}
