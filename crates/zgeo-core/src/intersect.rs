//! 曲线求交
//!
//! 所有求解器返回 0~2 个交点（函数图像可能更多），退化输入返回空结果。
//! 直线参数按各自的 `LineExtent` 截取，`tolerance` 是线段/射线端点的参数余量。

use crate::function::RealFunction;
use crate::geometry::{Arc, Circle, Ellipse, Geometry, Hyperbola, Line, Parabola};
use crate::math::{cross, Point2, Vector2, EPSILON};

/// 同一求解器内两个交点距离小于该值时视为重根
pub const DUPLICATE_DISTANCE: f64 = 1e-6;

/// x 轴（无限直线）
pub fn x_axis() -> Line {
    Line::infinite(Point2::origin(), Point2::new(1.0, 0.0))
}

/// y 轴（无限直线）
pub fn y_axis() -> Line {
    Line::infinite(Point2::origin(), Point2::new(0.0, 1.0))
}

fn push_unique(points: &mut Vec<Point2>, p: Point2) {
    if p.x.is_finite()
        && p.y.is_finite()
        && points
            .iter()
            .all(|q| (q - p).norm() >= DUPLICATE_DISTANCE)
    {
        points.push(p);
    }
}

/// a·t² + b·t + c = 0 的实根；首项系数可忽略时按一次方程处理
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let scale = a.abs().max(b.abs()).max(c.abs());
    if !scale.is_finite() || scale < EPSILON * EPSILON {
        return Vec::new();
    }
    if a.abs() <= 1e-12 * scale {
        if b.abs() <= 1e-12 * scale {
            return Vec::new();
        }
        return vec![-c / b];
    }

    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        // 相切时的舍入误差
        if disc > -1e-12 * (b * b).max(1.0) {
            disc = 0.0;
        } else {
            return Vec::new();
        }
    }
    let sqrt_disc = disc.sqrt();
    vec![(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)]
}

/// 把二次方程的参数根映射回直线上的点
fn line_points(line: &Line, roots: Vec<f64>, tolerance: f64) -> Vec<Point2> {
    let mut points = Vec::with_capacity(2);
    for t in roots {
        if line.contains_param(t, tolerance) {
            push_unique(&mut points, line.point_at(t));
        }
    }
    points
}

/// 直线-直线
///
/// 行列式求解，平行（含重合）时无交点。
pub fn line_line(l1: &Line, l2: &Line, tolerance: f64) -> Option<Point2> {
    let d1 = l1.delta();
    let d2 = l2.delta();
    let denom = cross(&d1, &d2);
    if denom.abs() < EPSILON {
        return None;
    }

    let d = l2.start - l1.start;
    let t1 = cross(&d, &d2) / denom;
    let t2 = cross(&d, &d1) / denom;

    (l1.contains_param(t1, tolerance) && l2.contains_param(t2, tolerance))
        .then(|| l1.start + d1 * t1)
}

/// 圆-直线
pub fn circle_line(circle: &Circle, line: &Line, tolerance: f64) -> Vec<Point2> {
    if !(circle.radius > 0.0) || line.is_degenerate() {
        return Vec::new();
    }
    let d = line.delta();
    let f = line.start - circle.center;

    let a = d.dot(&d);
    let b = 2.0 * f.dot(&d);
    let c = f.dot(&f) - circle.radius * circle.radius;
    line_points(line, quadratic_roots(a, b, c), tolerance)
}

/// 圆-圆（根轴法）
pub fn circle_circle(c1: &Circle, c2: &Circle) -> Vec<Point2> {
    let v = c2.center - c1.center;
    let d = v.norm();
    if d < EPSILON
        || !(c1.radius > 0.0 && c2.radius > 0.0)
        || d > c1.radius + c2.radius
        || d < (c1.radius - c2.radius).abs()
    {
        return Vec::new();
    }

    let a = (c1.radius * c1.radius - c2.radius * c2.radius + d * d) / (2.0 * d);
    let h = (c1.radius * c1.radius - a * a).max(0.0).sqrt();
    let dir = v / d;
    let p = c1.center + dir * a;
    let n = Vector2::new(-dir.y, dir.x);

    let mut points = Vec::with_capacity(2);
    push_unique(&mut points, p + n * h);
    push_unique(&mut points, p - n * h);
    points
}

/// 圆弧-直线：先求整圆再按弧的角度范围过滤
pub fn arc_line(arc: &Arc, line: &Line, tolerance: f64) -> Vec<Point2> {
    circle_line(&arc.circle(), line, tolerance)
        .into_iter()
        .filter(|p| arc.contains_point(p))
        .collect()
}

pub fn arc_circle(arc: &Arc, circle: &Circle) -> Vec<Point2> {
    circle_circle(&arc.circle(), circle)
        .into_iter()
        .filter(|p| arc.contains_point(p))
        .collect()
}

pub fn arc_arc(a1: &Arc, a2: &Arc) -> Vec<Point2> {
    circle_circle(&a1.circle(), &a2.circle())
        .into_iter()
        .filter(|p| a1.contains_point(p) && a2.contains_point(p))
        .collect()
}

/// 椭圆-直线：在椭圆局部坐标系求 u²/a² + v²/b² = 1
pub fn ellipse_line(ellipse: &Ellipse, line: &Line, tolerance: f64) -> Vec<Point2> {
    if ellipse.is_degenerate() || line.is_degenerate() {
        return Vec::new();
    }
    let p0 = ellipse.to_local(&line.start);
    let d = ellipse.to_local(&line.end) - p0;
    let a2 = ellipse.semi_major * ellipse.semi_major;
    let b2 = ellipse.semi_minor * ellipse.semi_minor;

    let qa = d.x * d.x / a2 + d.y * d.y / b2;
    let qb = 2.0 * (p0.x * d.x / a2 + p0.y * d.y / b2);
    let qc = p0.x * p0.x / a2 + p0.y * p0.y / b2 - 1.0;
    line_points(line, quadratic_roots(qa, qb, qc), tolerance)
}

/// 抛物线-直线：局部坐标 t² = 4ps，直线平行于对称轴时退化为一次方程
pub fn parabola_line(parabola: &Parabola, line: &Line, tolerance: f64) -> Vec<Point2> {
    if parabola.is_degenerate() || line.is_degenerate() {
        return Vec::new();
    }
    let p = parabola.focal_length;
    let l0 = parabola.to_local(&line.start);
    let d = parabola.to_local(&line.end) - l0;

    let qa = d.y * d.y;
    let qb = 2.0 * l0.y * d.y - 4.0 * p * d.x;
    let qc = l0.y * l0.y - 4.0 * p * l0.x;
    line_points(line, quadratic_roots(qa, qb, qc), tolerance)
}

/// 双曲线-直线：中心坐标系 u²/a² − v²/b² = 1，平行于渐近线时为一次方程
pub fn hyperbola_line(hyperbola: &Hyperbola, line: &Line, tolerance: f64) -> Vec<Point2> {
    if hyperbola.is_degenerate() || line.is_degenerate() {
        return Vec::new();
    }
    let l0 = hyperbola.to_local(&line.start);
    let d = hyperbola.to_local(&line.end) - l0;
    let a2 = hyperbola.a * hyperbola.a;
    let b2 = hyperbola.b * hyperbola.b;

    let qa = d.x * d.x / a2 - d.y * d.y / b2;
    let qb = 2.0 * (l0.x * d.x / a2 - l0.y * d.y / b2);
    let qc = l0.x * l0.x / a2 - l0.y * l0.y / b2 - 1.0;
    line_points(line, quadratic_roots(qa, qb, qc), tolerance)
}

/// 函数图像-直线
///
/// 在 [t_min, t_max] 上等距取 `samples` 段，检测 `g(t) = f(x(t)) − y(t)` 的变号，
/// 每个区间二分 `iterations` 次。求值失败的采样点直接跳过；
/// 二分后残差超过区间两端幅值的按极点处理并丢弃。
pub fn function_line<F: RealFunction + ?Sized>(
    f: &F,
    line: &Line,
    t_min: f64,
    t_max: f64,
    samples: usize,
    iterations: usize,
) -> Vec<Point2> {
    let mut points = Vec::new();
    if line.is_degenerate() || !t_min.is_finite() || !t_max.is_finite() || t_max <= t_min {
        return points;
    }

    let g = |t: f64| {
        let p = line.point_at(t);
        f.eval(p.x).map(|y| y - p.y)
    };

    let n = samples.max(1);
    let step = (t_max - t_min) / n as f64;
    let mut prev: Option<(f64, f64)> = None;

    for i in 0..=n {
        let t = t_min + step * i as f64;
        let Some(value) = g(t) else {
            prev = None;
            continue;
        };
        if value == 0.0 {
            push_unique(&mut points, line.point_at(t));
        } else if let Some((t0, v0)) = prev {
            if v0 != 0.0 && v0.signum() != value.signum() {
                if let Some(root) = bisect(&g, t0, v0, t, value, iterations) {
                    push_unique(&mut points, line.point_at(root));
                }
            }
        }
        prev = Some((t, value));
    }
    points
}

fn bisect<G: Fn(f64) -> Option<f64>>(
    g: &G,
    mut lo: f64,
    mut g_lo: f64,
    mut hi: f64,
    g_hi: f64,
    iterations: usize,
) -> Option<f64> {
    // 极点两侧变号但 |g| 越往里越大，最终残差会超过两端的幅值
    let bound = g_lo.abs().max(g_hi.abs());
    for _ in 0..iterations {
        let mid = 0.5 * (lo + hi);
        let g_mid = g(mid)?;
        if g_mid == 0.0 {
            return Some(mid);
        }
        if g_mid.signum() == g_lo.signum() {
            lo = mid;
            g_lo = g_mid;
        } else {
            hi = mid;
        }
    }
    let root = 0.5 * (lo + hi);
    let residual = g(root)?;
    (residual.abs() <= bound).then_some(root)
}

/// 两个解析曲线的交点（不含函数图像）
///
/// 点、标注等非曲线元素以及暂无闭式解的组合返回空结果。
pub fn intersect(a: &Geometry, b: &Geometry, tolerance: f64) -> Vec<Point2> {
    use Geometry as G;
    match (a, b) {
        (G::Line(l1), G::Line(l2)) => line_line(l1, l2, tolerance).into_iter().collect(),
        (G::Circle(c), G::Line(l)) | (G::Line(l), G::Circle(c)) => circle_line(c, l, tolerance),
        (G::Circle(c1), G::Circle(c2)) => circle_circle(c1, c2),
        (G::Arc(arc), G::Line(l)) | (G::Line(l), G::Arc(arc)) => arc_line(arc, l, tolerance),
        (G::Arc(arc), G::Circle(c)) | (G::Circle(c), G::Arc(arc)) => arc_circle(arc, c),
        (G::Arc(a1), G::Arc(a2)) => arc_arc(a1, a2),
        (G::Ellipse(e), G::Line(l)) | (G::Line(l), G::Ellipse(e)) => ellipse_line(e, l, tolerance),
        (G::Parabola(p), G::Line(l)) | (G::Line(l), G::Parabola(p)) => {
            parabola_line(p, l, tolerance)
        }
        (G::Hyperbola(h), G::Line(l)) | (G::Line(l), G::Hyperbola(h)) => {
            hyperbola_line(h, l, tolerance)
        }
        _ => Vec::new(),
    }
}
