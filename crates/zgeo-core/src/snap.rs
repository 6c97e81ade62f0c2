//! 捕捉系统
//!
//! 在阈值范围内为光标寻找最近的几何目标。所有类别共享一个"当前最优距离"，
//! 初值为阈值，新候选必须严格更近才会替换，因此距离相同时先评估的类别优先。
//!
//! 评估顺序：
//! - 原点
//! - 点元素
//! - 交点（曲线两两相交，以及每条曲线与两条坐标轴）
//! - 线段中点
//! - 直线上最近点
//! - 圆/圆弧上最近点
//! - 函数图像、椭圆、抛物线、双曲线上最近点（密集采样 + 局部细化）
//!
//! 没有候选时返回原始查询点，`snap_type` 为 None。

use crate::conic::solve_t_max_for_viewport;
use crate::element::{Element, ElementId};
use crate::function::{ExpressionFunctions, FunctionSource, RealFunction};
use crate::geometry::{Branch, Ellipse, Geometry, Hyperbola, Line, LineExtent, Parabola};
use crate::intersect::{function_line, intersect, x_axis, y_axis};
use crate::math::{distance, BoundingBox2, Point2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// 捕捉类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapType {
    /// 点元素或原点
    Point,
    /// 线段中点
    Midpoint,
    /// 交点
    Intersection,
    OnLine,
    OnCircle,
    OnEllipse,
    OnParabola,
    OnHyperbola,
    OnFunction,
}

impl SnapType {
    /// 获取捕捉类型的名称
    pub fn name(&self) -> &'static str {
        match self {
            SnapType::Point => "点",
            SnapType::Midpoint => "中点",
            SnapType::Intersection => "交点",
            SnapType::OnLine => "直线上",
            SnapType::OnCircle => "圆上",
            SnapType::OnEllipse => "椭圆上",
            SnapType::OnParabola => "抛物线上",
            SnapType::OnHyperbola => "双曲线上",
            SnapType::OnFunction => "函数图像上",
        }
    }

    /// 获取捕捉类型的简写
    pub fn shortcut(&self) -> &'static str {
        match self {
            SnapType::Point => "PNT",
            SnapType::Midpoint => "MID",
            SnapType::Intersection => "INT",
            SnapType::OnLine => "LIN",
            SnapType::OnCircle => "CIR",
            SnapType::OnEllipse => "ELL",
            SnapType::OnParabola => "PAR",
            SnapType::OnHyperbola => "HYP",
            SnapType::OnFunction => "FUN",
        }
    }
}

/// 捕捉结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    /// 捕捉到的世界坐标（未捕捉时为查询点本身）
    pub position: Point2,
    /// 关联的元素（交点和原点为 None，与坐标轴的交点记录曲线）
    pub element: Option<ElementId>,
    pub snap_type: Option<SnapType>,
    /// 提示文本
    pub label: String,
}

impl SnapResult {
    pub fn unsnapped(position: Point2) -> Self {
        Self {
            position,
            element: None,
            snap_type: None,
            label: String::new(),
        }
    }

    pub fn is_snapped(&self) -> bool {
        self.snap_type.is_some()
    }
}

/// 捕捉配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// 捕捉阈值（世界坐标）
    pub threshold: f64,
    pub snap_to_origin: bool,
    /// 计算曲线与坐标轴的交点
    pub snap_to_axes: bool,
    /// 线段/射线端点处的参数余量
    pub segment_clamp_tolerance: f64,
    /// 函数求交的采样段数
    pub root_samples: usize,
    /// 函数求交的二分次数
    pub bisection_iterations: usize,
    /// 曲线最近点的采样数
    pub curve_samples: usize,
    /// 曲线最近点的细化迭代次数
    pub refine_iterations: usize,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            threshold: 10.0,
            snap_to_origin: true,
            snap_to_axes: true,
            segment_clamp_tolerance: 0.01,
            root_samples: 40,
            bisection_iterations: 10,
            curve_samples: 200,
            refine_iterations: 24,
        }
    }
}

/// 运行中的最优候选
struct Best {
    query: Point2,
    distance: f64,
    result: Option<SnapResult>,
}

impl Best {
    fn new(query: Point2, threshold: f64) -> Self {
        Self {
            query,
            distance: threshold,
            result: None,
        }
    }

    fn offer(
        &mut self,
        position: Point2,
        element: Option<ElementId>,
        snap_type: SnapType,
        label: impl FnOnce() -> String,
    ) {
        let d = distance(&self.query, &position);
        if d < self.distance {
            self.distance = d;
            self.result = Some(SnapResult {
                position,
                element,
                snap_type: Some(snap_type),
                label: label(),
            });
        }
    }
}

/// 参与求交和"曲线上"捕捉的元素
enum Curve<'a> {
    Analytic(&'a Element),
    Function(&'a Element, Box<dyn RealFunction + 'a>),
}

impl Curve<'_> {
    fn element(&self) -> &Element {
        match self {
            Curve::Analytic(e) | Curve::Function(e, _) => e,
        }
    }
}

/// 捕捉引擎
#[derive(Debug, Clone, Default)]
pub struct SnapEngine {
    config: SnapConfig,
}

impl SnapEngine {
    pub fn new(config: SnapConfig) -> Self {
        Self { config }
    }

    /// 获取配置
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// 获取配置（可变）
    pub fn config_mut(&mut self) -> &mut SnapConfig {
        &mut self.config
    }

    /// 寻找最佳捕捉位置
    ///
    /// # 参数
    /// - `query`: 光标的世界坐标
    /// - `elements`: 候选元素（隐藏的元素被忽略）
    /// - `exclude`: 不参与捕捉的元素，如正在拖动的点
    /// - `functions`: 函数图像求值器来源，None 时使用 evalexpr 编译表达式
    pub fn snap(
        &self,
        query: Point2,
        elements: &[Element],
        exclude: &[ElementId],
        functions: Option<&dyn FunctionSource>,
    ) -> SnapResult {
        let config = &self.config;
        if !(config.threshold > 0.0) || !query.x.is_finite() || !query.y.is_finite() {
            return SnapResult::unsnapped(query);
        }
        let source: &dyn FunctionSource = functions.unwrap_or(&ExpressionFunctions);
        let mut best = Best::new(query, config.threshold);

        let active: Vec<&Element> = elements
            .iter()
            .filter(|e| e.visible && !exclude.contains(&e.id))
            .collect();

        // 0. 原点
        if config.snap_to_origin {
            best.offer(Point2::origin(), None, SnapType::Point, || "O".to_string());
        }

        // 1. 点元素
        for el in &active {
            if let Geometry::Point(p) = el.geometry {
                best.offer(p, Some(el.id), SnapType::Point, || el.name.clone());
            }
        }

        let curves: Vec<Curve> = active
            .iter()
            .copied()
            .filter_map(|el| match &el.geometry {
                Geometry::Line(_)
                | Geometry::Circle(_)
                | Geometry::Arc(_)
                | Geometry::Ellipse(_)
                | Geometry::Parabola(_)
                | Geometry::Hyperbola(_) => Some(Curve::Analytic(el)),
                Geometry::Function(_) => source.function_for(el).map(|f| Curve::Function(el, f)),
                _ => None,
            })
            .collect();

        // 1.5 交点
        for (i, a) in curves.iter().enumerate() {
            for b in &curves[i + 1..] {
                for p in self.curve_intersections(a, b, &query) {
                    best.offer(p, None, SnapType::Intersection, || {
                        format!("{} ∩ {}", a.element().name, b.element().name)
                    });
                }
            }
            if config.snap_to_axes {
                for (axis, axis_name) in [(x_axis(), "x"), (y_axis(), "y")] {
                    for p in self.curve_line_intersections(a, &axis, &query) {
                        best.offer(p, Some(a.element().id), SnapType::Intersection, || {
                            format!("{} ∩ {}", a.element().name, axis_name)
                        });
                    }
                }
            }
        }

        // 2. 线段中点
        for el in &active {
            if let Geometry::Line(line) = &el.geometry {
                if line.extent == LineExtent::Segment && !line.is_degenerate() {
                    best.offer(line.midpoint(), Some(el.id), SnapType::Midpoint, || {
                        el.name.clone()
                    });
                }
            }
        }

        // 3. 直线上
        for el in &active {
            if let Geometry::Line(line) = &el.geometry {
                if let Some(p) = nearest_on_line_interior(line, &query) {
                    best.offer(p, Some(el.id), SnapType::OnLine, || el.name.clone());
                }
            }
        }

        // 4. 圆/圆弧上
        for el in &active {
            let nearest = match &el.geometry {
                Geometry::Circle(c) => c.nearest_point(&query),
                Geometry::Arc(a) => a.nearest_point(&query),
                _ => None,
            };
            if let Some(p) = nearest {
                best.offer(p, Some(el.id), SnapType::OnCircle, || el.name.clone());
            }
        }

        // 4.5 函数图像上
        for curve in &curves {
            if let Curve::Function(el, f) = curve {
                if let Some(p) = self.nearest_on_function(f.as_ref(), &query) {
                    best.offer(p, Some(el.id), SnapType::OnFunction, || el.name.clone());
                }
            }
        }

        // 4.6 ~ 4.8 圆锥曲线上
        for el in &active {
            if let Geometry::Ellipse(e) = &el.geometry {
                if let Some(p) = self.nearest_on_ellipse(e, &query) {
                    best.offer(p, Some(el.id), SnapType::OnEllipse, || el.name.clone());
                }
            }
        }
        for el in &active {
            if let Geometry::Parabola(parabola) = &el.geometry {
                if let Some(p) = self.nearest_on_parabola(parabola, &query) {
                    best.offer(p, Some(el.id), SnapType::OnParabola, || el.name.clone());
                }
            }
        }
        for el in &active {
            if let Geometry::Hyperbola(h) = &el.geometry {
                if let Some(p) = self.nearest_on_hyperbola(h, &query) {
                    best.offer(p, Some(el.id), SnapType::OnHyperbola, || el.name.clone());
                }
            }
        }

        let result = best
            .result
            .unwrap_or_else(|| SnapResult::unsnapped(query));
        tracing::trace!(
            x = query.x,
            y = query.y,
            snap_type = ?result.snap_type,
            "snap resolved"
        );
        result
    }

    fn curve_intersections(&self, a: &Curve, b: &Curve, query: &Point2) -> Vec<Point2> {
        match (a, b) {
            (Curve::Analytic(ea), Curve::Analytic(eb)) => intersect(
                &ea.geometry,
                &eb.geometry,
                self.config.segment_clamp_tolerance,
            ),
            (Curve::Function(_, f), Curve::Analytic(other))
            | (Curve::Analytic(other), Curve::Function(_, f)) => match &other.geometry {
                Geometry::Line(line) => self.function_line_near(f.as_ref(), line, query),
                _ => Vec::new(),
            },
            (Curve::Function(..), Curve::Function(..)) => Vec::new(),
        }
    }

    fn curve_line_intersections(&self, curve: &Curve, line: &Line, query: &Point2) -> Vec<Point2> {
        match curve {
            Curve::Analytic(el) => intersect(
                &el.geometry,
                &Geometry::Line(*line),
                self.config.segment_clamp_tolerance,
            ),
            Curve::Function(_, f) => self.function_line_near(f.as_ref(), line, query),
        }
    }

    /// 只在光标投影附近的参数窗口内求函数与直线的交点
    fn function_line_near(&self, f: &dyn RealFunction, line: &Line, query: &Point2) -> Vec<Point2> {
        let (Some(t_center), length) = (line.project_param(query), line.length()) else {
            return Vec::new();
        };
        let half = 2.0 * self.config.threshold / length;
        let (lo, hi) = line.param_bounds(0.0);
        let t_min = (t_center - half).max(lo);
        let t_max = (t_center + half).min(hi);
        if t_min >= t_max {
            return Vec::new();
        }
        function_line(
            f,
            line,
            t_min,
            t_max,
            self.config.root_samples,
            self.config.bisection_iterations,
        )
    }

    fn nearest_on_function(&self, f: &dyn RealFunction, query: &Point2) -> Option<Point2> {
        let r = self.config.threshold;
        nearest_on_curve(
            |x| f.eval(x).map(|y| Point2::new(x, y)),
            query,
            query.x - r,
            query.x + r,
            self.config.curve_samples,
            self.config.refine_iterations,
        )
    }

    fn nearest_on_ellipse(&self, ellipse: &Ellipse, query: &Point2) -> Option<Point2> {
        if ellipse.is_degenerate() {
            return None;
        }
        nearest_on_curve(
            |theta| Some(ellipse.point_at(theta)),
            query,
            0.0,
            TAU,
            self.config.curve_samples,
            self.config.refine_iterations,
        )
    }

    /// 横向坐标是 1-Lipschitz 投影，阈值内的点一定落在 [t_q − r, t_q + r]
    fn nearest_on_parabola(&self, parabola: &Parabola, query: &Point2) -> Option<Point2> {
        if parabola.is_degenerate() {
            return None;
        }
        let t_q = parabola.to_local(query).y;
        let r = self.config.threshold;
        nearest_on_curve(
            |t| Some(parabola.point_at(t)),
            query,
            t_q - r,
            t_q + r,
            self.config.curve_samples,
            self.config.refine_iterations,
        )
    }

    fn nearest_on_hyperbola(&self, hyperbola: &Hyperbola, query: &Point2) -> Option<Point2> {
        if hyperbola.is_degenerate() {
            return None;
        }
        let window = BoundingBox2::around(*query, self.config.threshold);
        if hyperbola.to_local(query).x.abs() + self.config.threshold < hyperbola.a {
            return None;
        }
        let t_max = solve_t_max_for_viewport(hyperbola, &window);

        [Branch::Primary, Branch::Secondary]
            .into_iter()
            .filter_map(|branch| {
                nearest_on_curve(
                    |t| Some(hyperbola.point_at(t, branch)),
                    query,
                    -t_max,
                    t_max,
                    self.config.curve_samples,
                    self.config.refine_iterations,
                )
            })
            .min_by(|a, b| distance(a, query).total_cmp(&distance(b, query)))
    }
}

/// 直线上的最近点，不含端点
///
/// 线段要求 0 < t < 1，射线要求 t > 0，无限直线不截取。
fn nearest_on_line_interior(line: &Line, query: &Point2) -> Option<Point2> {
    let t = line.project_param(query)?;
    let inside = match line.extent {
        LineExtent::Segment => t > 0.0 && t < 1.0,
        LineExtent::Ray => t > 0.0,
        LineExtent::Infinite => true,
    };
    inside.then(|| line.point_at(t))
}

/// 参数曲线上离查询点最近的点
///
/// 先在 [lo, hi] 上等距采样，再在最优采样点两侧的区间内做黄金分割细化。
/// 求值失败的参数被跳过。
fn nearest_on_curve<C: Fn(f64) -> Option<Point2>>(
    curve: C,
    query: &Point2,
    lo: f64,
    hi: f64,
    samples: usize,
    iterations: usize,
) -> Option<Point2> {
    if !lo.is_finite() || !hi.is_finite() || hi < lo {
        return None;
    }
    let n = samples.max(2);
    let step = (hi - lo) / n as f64;
    let dist = |t: f64| curve(t).map(|p| distance(&p, query));

    let mut best: Option<(f64, f64)> = None;
    for i in 0..=n {
        let t = lo + step * i as f64;
        if let Some(d) = dist(t) {
            if d.is_finite() && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((t, d));
            }
        }
    }
    let (t_best, d_best) = best?;
    if step == 0.0 {
        return curve(t_best);
    }

    // 黄金分割
    const INV_PHI: f64 = 0.618_033_988_749_894_9;
    let (mut a, mut b) = ((t_best - step).max(lo), (t_best + step).min(hi));
    for _ in 0..iterations {
        let c = b - (b - a) * INV_PHI;
        let d = a + (b - a) * INV_PHI;
        match (dist(c), dist(d)) {
            (Some(dc), Some(dd)) if dc < dd => b = d,
            (Some(_), Some(_)) => a = c,
            _ => break,
        }
    }
    let t_refined = 0.5 * (a + b);
    match dist(t_refined) {
        Some(d) if d < d_best => curve(t_refined),
        _ => curve(t_best),
    }
}

/// 以默认配置和给定阈值捕捉
pub fn get_snap_position(
    x: f64,
    y: f64,
    elements: &[Element],
    threshold: f64,
    exclude_ids: &[ElementId],
    resolver: Option<&dyn FunctionSource>,
) -> SnapResult {
    let engine = SnapEngine::new(SnapConfig {
        threshold,
        ..SnapConfig::default()
    });
    engine.snap(Point2::new(x, y), elements, exclude_ids, resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Definition;
    use crate::function::FunctionTable;
    use crate::geometry::{Arc, Circle, FunctionGraph, HyperbolaOrientation};
    use approx::assert_relative_eq;

    fn element(name: &str, geometry: Geometry) -> Element {
        Element::new(name, Definition::Free, geometry)
    }

    fn segment(name: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> Element {
        element(
            name,
            Geometry::Line(Line::new(Point2::new(x1, y1), Point2::new(x2, y2))),
        )
    }

    #[test]
    fn test_unsnapped_returns_query() {
        let r = get_snap_position(100.0, 100.0, &[], 5.0, &[], None);
        assert_eq!(r.position, Point2::new(100.0, 100.0));
        assert!(r.snap_type.is_none());
        assert!(r.element.is_none());
        assert!(!r.is_snapped());
    }

    #[test]
    fn test_snap_to_point() {
        let a = Element::free_point("A", 50.0, 50.0);
        let id = a.id;
        let r = get_snap_position(52.0, 51.0, &[a], 5.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::Point));
        assert_eq!(r.element, Some(id));
        assert_eq!(r.position, Point2::new(50.0, 50.0));
        assert_eq!(r.label, "A");
    }

    #[test]
    fn test_origin_wins_ties() {
        let a = Element::free_point("A", 0.0, 0.0);
        let r = get_snap_position(1.0, 1.0, &[a], 5.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::Point));
        assert!(r.element.is_none());
        assert_eq!(r.label, "O");
    }

    #[test]
    fn test_hidden_and_excluded_are_ignored() {
        let a = Element::free_point("A", 50.0, 50.0).hidden();
        let b = Element::free_point("B", 51.0, 50.0);
        let excluded = b.id;
        let r = get_snap_position(50.5, 50.0, &[a, b], 5.0, &[excluded], None);
        assert!(!r.is_snapped());
    }

    #[test]
    fn test_snap_to_intersection() {
        let l1 = segment("a", 0.0, 0.0, 10.0, 10.0);
        let l2 = segment("b", 0.0, 10.0, 10.0, 0.0);
        let r = get_snap_position(5.0, 5.0, &[l1, l2], 1.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::Intersection));
        assert_relative_eq!(r.position.x, 5.0, epsilon = 1e-10);
        assert_relative_eq!(r.position.y, 5.0, epsilon = 1e-10);
        assert_eq!(r.label, "a ∩ b");
    }

    #[test]
    fn test_snap_to_midpoint_and_line() {
        let l = segment("s", 20.0, 20.0, 40.0, 20.0);
        let r = get_snap_position(30.2, 20.5, &[l.clone()], 2.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnLine));
        assert_relative_eq!(r.position.x, 30.2, epsilon = 1e-10);
        assert_relative_eq!(r.position.y, 20.0, epsilon = 1e-10);

        let r = get_snap_position(30.0, 20.5, &[l.clone()], 2.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::Midpoint));

        // 端点外侧不吸附到线段
        let r = get_snap_position(41.0, 20.2, &[l], 2.0, &[], None);
        assert!(!r.is_snapped());
    }

    #[test]
    fn test_ray_and_infinite_line() {
        let ray = element(
            "r",
            Geometry::Line(Line::ray(Point2::new(20.0, 20.0), Point2::new(21.0, 20.0))),
        );
        let r = get_snap_position(60.0, 20.5, &[ray.clone()], 2.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnLine));
        let r = get_snap_position(18.0, 20.5, &[ray], 2.0, &[], None);
        assert!(!r.is_snapped());

        let inf = element(
            "l",
            Geometry::Line(Line::infinite(Point2::new(20.0, 20.0), Point2::new(21.0, 20.0))),
        );
        let r = get_snap_position(-80.0, 20.5, &[inf], 2.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnLine));
        assert_relative_eq!(r.position.y, 20.0, epsilon = 1e-10);
    }

    #[test]
    fn test_snap_on_circle_and_arc() {
        let c = element("c", Geometry::Circle(Circle::new(Point2::new(50.0, 50.0), 10.0)));
        let r = get_snap_position(50.0, 61.0, &[c], 2.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnCircle));
        assert_relative_eq!(r.position.y, 60.0, epsilon = 1e-10);

        // 下半部分不在弧上
        let arc = element(
            "arc",
            Geometry::Arc(Arc::new(Point2::new(50.0, 50.0), 10.0, 0.0, std::f64::consts::PI)),
        );
        let r = get_snap_position(50.0, 39.0, &[arc], 2.0, &[], None);
        assert!(!r.is_snapped());
    }

    #[test]
    fn test_snap_on_function() {
        let f = element("f", Geometry::Function(FunctionGraph::new("x^2")));
        let r = get_snap_position(1.0, 1.5, &[f], 3.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnFunction));
        assert_relative_eq!(r.position.y, r.position.x * r.position.x, epsilon = 1e-9);
        assert!(distance(&r.position, &Point2::new(1.0, 1.5)) < 0.5);
    }

    #[test]
    fn test_function_source_override() {
        let f = element("f", Geometry::Function(FunctionGraph::new("not an expression (")));
        let line = |x: f64| Some(x + 30.0);
        let table = FunctionTable::new().with(f.id, &line);

        let r = get_snap_position(10.0, 40.5, &[f.clone()], 2.0, &[], Some(&table));
        assert_eq!(r.snap_type, Some(SnapType::OnFunction));

        // 默认来源编译失败，忽略该元素
        let r = get_snap_position(10.0, 40.5, &[f], 2.0, &[], None);
        assert!(!r.is_snapped());
    }

    #[test]
    fn test_function_line_window() {
        let engine = SnapEngine::new(SnapConfig {
            threshold: 2.0,
            ..SnapConfig::default()
        });
        let f = |x: f64| Some(x);
        let line = Line::new(Point2::new(10.0, 30.0), Point2::new(30.0, 10.0));

        let near = engine.function_line_near(&f, &line, &Point2::new(20.5, 19.5));
        assert_eq!(near.len(), 1);
        assert_relative_eq!(near[0].x, 20.0, epsilon = 1e-3);
        assert_relative_eq!(near[0].y, 20.0, epsilon = 1e-3);

        // 交点不在光标附近的窗口内
        let far = engine.function_line_near(&f, &line, &Point2::new(11.0, 29.0));
        assert!(far.is_empty());
    }

    #[test]
    fn test_axis_intersection() {
        let c = element("c", Geometry::Circle(Circle::new(Point2::new(40.0, 3.0), 5.0)));
        let id = c.id;
        let r = get_snap_position(36.0, 0.0, &[c], 1.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::Intersection));
        assert_eq!(r.element, Some(id));
        assert_relative_eq!(r.position.x, 36.0, epsilon = 1e-10);
        assert_eq!(r.label, "c ∩ x");
    }

    #[test]
    fn test_snap_on_conics() {
        let e = element(
            "e",
            Geometry::Ellipse(Ellipse::new(Point2::new(20.0, 20.0), 5.0, 3.0, 0.0)),
        );
        let r = get_snap_position(25.5, 20.0, &[e], 2.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnEllipse));
        assert_relative_eq!(r.position.x, 25.0, epsilon = 1e-6);

        let p = element(
            "p",
            Geometry::Parabola(Parabola::new(
                Point2::new(30.0, 0.0),
                1.0,
                std::f64::consts::FRAC_PI_2,
            )),
        );
        let r = get_snap_position(32.0, 0.8, &[p], 1.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnParabola));
        let dx = r.position.x - 30.0;
        assert_relative_eq!(r.position.y, dx * dx / 4.0, epsilon = 1e-9);

        let h = element(
            "h",
            Geometry::Hyperbola(Hyperbola::new(
                Point2::new(50.0, 50.0),
                3.0,
                2.0,
                HyperbolaOrientation::Horizontal,
            )),
        );
        let r = get_snap_position(46.7, 50.0, &[h], 1.0, &[], None);
        assert_eq!(r.snap_type, Some(SnapType::OnHyperbola));
        assert_relative_eq!(r.position.x, 47.0, epsilon = 1e-6);
    }

    #[test]
    fn test_engine_config() {
        let mut engine = SnapEngine::default();
        assert_eq!(engine.config().threshold, 10.0);
        engine.config_mut().snap_to_origin = false;
        let r = engine.snap(Point2::new(1.0, 1.0), &[], &[], None);
        assert!(!r.is_snapped());
        assert_eq!(SnapType::OnHyperbola.shortcut(), "HYP");
    }
}
