//! 几何图元定义
//!
//! 支持的图元：
//! - 点 (Point)
//! - 直线/射线/线段 (Line)
//! - 圆 (Circle)、圆弧 (Arc)
//! - 椭圆 (Ellipse)、抛物线 (Parabola)、双曲线 (Hyperbola)
//! - 角 (Angle)、度量标签 (Measurement)
//! - 函数图像 (Function)、线段标记 (SegmentMark)、文本 (Text)
//!
//! 这里只放数值属性和求值辅助，如何由依赖计算这些属性见 `propagation`。

use crate::element::ElementKind;
use crate::math::{normalize_angle, perp, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};

/// 几何类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point2),
    Line(Line),
    Circle(Circle),
    Arc(Arc),
    Ellipse(Ellipse),
    Parabola(Parabola),
    Hyperbola(Hyperbola),
    Angle(AngleMark),
    Measurement(Measurement),
    Function(FunctionGraph),
    SegmentMark(SegmentMark),
    Text(Text),
}

impl Geometry {
    /// 元素类别标签
    pub fn kind(&self) -> ElementKind {
        match self {
            Geometry::Point(_) => ElementKind::Point,
            Geometry::Line(_) => ElementKind::Line,
            Geometry::Circle(_) => ElementKind::Circle,
            Geometry::Arc(_) => ElementKind::Arc,
            Geometry::Ellipse(_) => ElementKind::Ellipse,
            Geometry::Parabola(_) => ElementKind::Parabola,
            Geometry::Hyperbola(_) => ElementKind::Hyperbola,
            Geometry::Angle(_) => ElementKind::Angle,
            Geometry::Measurement(_) => ElementKind::Measurement,
            Geometry::Function(_) => ElementKind::Function,
            Geometry::SegmentMark(_) => ElementKind::SegmentMark,
            Geometry::Text(_) => ElementKind::Text,
        }
    }

    /// 获取几何的类型名称
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn as_point(&self) -> Option<Point2> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Geometry::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_circle(&self) -> Option<&Circle> {
        match self {
            Geometry::Circle(c) => Some(c),
            _ => None,
        }
    }
}

/// 直线的延伸方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineExtent {
    /// 线段（两端截止）
    #[default]
    Segment,
    /// 射线（从起点延伸）
    Ray,
    /// 无限直线
    Infinite,
}

/// 直线（由两点定义，`extent` 决定参数范围）
///
/// 参数形式：`start + (end - start) * t`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
    #[serde(default)]
    pub extent: LineExtent,
}

impl Line {
    /// 线段
    pub fn new(start: Point2, end: Point2) -> Self {
        Self {
            start,
            end,
            extent: LineExtent::Segment,
        }
    }

    pub fn infinite(start: Point2, end: Point2) -> Self {
        Self {
            start,
            end,
            extent: LineExtent::Infinite,
        }
    }

    pub fn ray(start: Point2, end: Point2) -> Self {
        Self {
            start,
            end,
            extent: LineExtent::Ray,
        }
    }

    pub fn with_extent(mut self, extent: LineExtent) -> Self {
        self.extent = extent;
        self
    }

    /// 方向向量（未归一化）
    pub fn delta(&self) -> Vector2 {
        self.end - self.start
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        self.delta().norm()
    }

    /// 单位方向向量；退化时返回 None
    pub fn direction(&self) -> Option<Vector2> {
        let len = self.length();
        if len < EPSILON {
            None
        } else {
            Some(self.delta() / len)
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.length() < EPSILON
    }

    pub fn is_segment(&self) -> bool {
        self.extent == LineExtent::Segment
    }

    /// 计算线段中点
    pub fn midpoint(&self) -> Point2 {
        Point2::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    pub fn point_at(&self, t: f64) -> Point2 {
        self.start + self.delta() * t
    }

    /// 点在无限直线上的投影参数
    pub fn project_param(&self, point: &Point2) -> Option<f64> {
        let v = self.delta();
        let len_sq = v.dot(&v);
        if len_sq < EPSILON * EPSILON {
            return None;
        }
        Some((point - self.start).dot(&v) / len_sq)
    }

    /// 参数有效范围，`tolerance` 为线段两端的额外余量
    pub fn param_bounds(&self, tolerance: f64) -> (f64, f64) {
        match self.extent {
            LineExtent::Segment => (-tolerance, 1.0 + tolerance),
            LineExtent::Ray => (-tolerance, f64::INFINITY),
            LineExtent::Infinite => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    pub fn contains_param(&self, t: f64, tolerance: f64) -> bool {
        let (lo, hi) = self.param_bounds(tolerance);
        t >= lo && t <= hi
    }

    /// 按延伸方式截取后的最近点
    pub fn nearest_point(&self, point: &Point2) -> Point2 {
        match self.project_param(point) {
            Some(t) => {
                let (lo, hi) = self.param_bounds(0.0);
                self.point_at(t.clamp(lo, hi))
            }
            None => self.start,
        }
    }

    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        (point - self.nearest_point(point)).norm()
    }
}

/// 圆
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// 获取圆上指定角度的点
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// 径向投影；查询点与圆心重合时无定义
    pub fn nearest_point(&self, point: &Point2) -> Option<Point2> {
        let d = point - self.center;
        let len = d.norm();
        if len < EPSILON {
            return None;
        }
        Some(self.center + d * (self.radius / len))
    }

    /// 计算点到圆的距离（负值表示在圆内）
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        (point - self.center).norm() - self.radius
    }
}

/// 圆弧（逆时针，从 start_angle 到 end_angle）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    /// 起始角度（弧度）
    pub start_angle: f64,
    /// 终止角度（弧度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 计算扫过的角度，范围 [0, 2π)
    pub fn sweep_angle(&self) -> f64 {
        normalize_angle(self.end_angle - self.start_angle)
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.center, self.radius)
    }

    /// 检查角度是否在弧的范围内
    pub fn contains_angle(&self, angle: f64) -> bool {
        let offset = normalize_angle(angle - self.start_angle);
        offset <= self.sweep_angle() + 1e-9
    }

    /// 检查点是否在弧的角度范围内（不检查半径）
    pub fn contains_point(&self, point: &Point2) -> bool {
        let angle = (point.y - self.center.y).atan2(point.x - self.center.x);
        self.contains_angle(angle)
    }

    pub fn start_point(&self) -> Point2 {
        self.circle().point_at_angle(self.start_angle)
    }

    pub fn end_point(&self) -> Point2 {
        self.circle().point_at_angle(self.end_angle)
    }

    /// 径向投影，投影落在弧外时返回 None
    pub fn nearest_point(&self, point: &Point2) -> Option<Point2> {
        let candidate = self.circle().nearest_point(point)?;
        self.contains_point(&candidate).then_some(candidate)
    }
}

/// 椭圆
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point2,
    /// 长半轴 a
    pub semi_major: f64,
    /// 短半轴 b
    pub semi_minor: f64,
    /// 长轴相对 x 轴的旋转（弧度）
    pub rotation: f64,
}

impl Ellipse {
    pub fn new(center: Point2, semi_major: f64, semi_minor: f64, rotation: f64) -> Self {
        Self {
            center,
            semi_major,
            semi_minor,
            rotation,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.semi_major > EPSILON && self.semi_minor > EPSILON)
            || !self.center.x.is_finite()
            || !self.center.y.is_finite()
    }

    /// 世界坐标 -> 椭圆局部坐标 (u沿长轴, v沿短轴)
    pub fn to_local(&self, point: &Point2) -> Vector2 {
        let d = point - self.center;
        let (sin, cos) = self.rotation.sin_cos();
        Vector2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos)
    }

    pub fn from_local(&self, local: &Vector2) -> Point2 {
        let (sin, cos) = self.rotation.sin_cos();
        Point2::new(
            self.center.x + local.x * cos - local.y * sin,
            self.center.y + local.x * sin + local.y * cos,
        )
    }

    /// 参数角 θ 处的点
    pub fn point_at(&self, theta: f64) -> Point2 {
        self.from_local(&Vector2::new(
            self.semi_major * theta.cos(),
            self.semi_minor * theta.sin(),
        ))
    }

    /// 隐式方程值 u²/a² + v²/b² - 1
    pub fn implicit(&self, point: &Point2) -> f64 {
        let l = self.to_local(point);
        l.x * l.x / (self.semi_major * self.semi_major)
            + l.y * l.y / (self.semi_minor * self.semi_minor)
            - 1.0
    }

    /// 两个焦点
    pub fn foci(&self) -> (Point2, Point2) {
        let c = (self.semi_major * self.semi_major - self.semi_minor * self.semi_minor)
            .max(0.0)
            .sqrt();
        (
            self.from_local(&Vector2::new(c, 0.0)),
            self.from_local(&Vector2::new(-c, 0.0)),
        )
    }
}

/// 抛物线（标准形式）
///
/// `vertex + u·(t²/4p) + v·t`，其中 u 为对称轴方向，v 为 u 的逆时针法向。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parabola {
    pub vertex: Point2,
    /// 焦距 p（顶点到焦点的距离）
    pub focal_length: f64,
    /// 对称轴方向角（从顶点指向焦点）
    pub axis_angle: f64,
}

impl Parabola {
    pub fn new(vertex: Point2, focal_length: f64, axis_angle: f64) -> Self {
        Self {
            vertex,
            focal_length,
            axis_angle,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.focal_length > EPSILON) || !self.focal_length.is_finite()
    }

    /// 对称轴单位向量 u
    pub fn axis(&self) -> Vector2 {
        let (sin, cos) = self.axis_angle.sin_cos();
        Vector2::new(cos, sin)
    }

    /// 横向单位向量 v
    pub fn lateral(&self) -> Vector2 {
        perp(&self.axis())
    }

    pub fn focus(&self) -> Point2 {
        self.vertex + self.axis() * self.focal_length
    }

    /// 准线（无限直线）
    pub fn directrix(&self) -> Line {
        let base = self.vertex - self.axis() * self.focal_length;
        Line::infinite(base, base + self.lateral())
    }

    pub fn point_at(&self, t: f64) -> Point2 {
        self.vertex
            + self.axis() * (t * t / (4.0 * self.focal_length))
            + self.lateral() * t
    }

    /// 世界坐标 -> (沿轴 s, 横向 t)
    pub fn to_local(&self, point: &Point2) -> Vector2 {
        let d = point - self.vertex;
        Vector2::new(d.dot(&self.axis()), d.dot(&self.lateral()))
    }

    /// 隐式方程值 t² - 4ps
    pub fn implicit(&self, point: &Point2) -> f64 {
        let l = self.to_local(point);
        l.y * l.y - 4.0 * self.focal_length * l.x
    }
}

/// 双曲线方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HyperbolaOrientation {
    /// (x-h)²/a² - (y-k)²/b² = 1
    #[default]
    Horizontal,
    /// (y-k)²/a² - (x-h)²/b² = 1
    Vertical,
}

/// 双曲线分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    /// 正方向分支（右/上）
    Primary,
    /// 负方向分支（左/下）
    Secondary,
}

impl Branch {
    pub fn sign(&self) -> f64 {
        match self {
            Branch::Primary => 1.0,
            Branch::Secondary => -1.0,
        }
    }
}

/// 双曲线（轴对齐）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperbola {
    pub center: Point2,
    /// 实半轴
    pub a: f64,
    /// 虚半轴
    pub b: f64,
    pub orientation: HyperbolaOrientation,
}

impl Hyperbola {
    pub fn new(center: Point2, a: f64, b: f64, orientation: HyperbolaOrientation) -> Self {
        Self {
            center,
            a,
            b,
            orientation,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.a > 0.0 && self.b > 0.0)
            || !self.a.is_finite()
            || !self.b.is_finite()
            || !self.center.x.is_finite()
            || !self.center.y.is_finite()
    }

    /// 世界坐标 -> (实轴分量 u, 虚轴分量 v)
    pub fn to_local(&self, point: &Point2) -> Vector2 {
        let d = point - self.center;
        match self.orientation {
            HyperbolaOrientation::Horizontal => Vector2::new(d.x, d.y),
            HyperbolaOrientation::Vertical => Vector2::new(d.y, d.x),
        }
    }

    pub fn from_local(&self, local: &Vector2) -> Point2 {
        match self.orientation {
            HyperbolaOrientation::Horizontal => {
                Point2::new(self.center.x + local.x, self.center.y + local.y)
            }
            HyperbolaOrientation::Vertical => {
                Point2::new(self.center.x + local.y, self.center.y + local.x)
            }
        }
    }

    /// cosh/sinh 参数化
    pub fn point_at(&self, t: f64, branch: Branch) -> Point2 {
        self.from_local(&Vector2::new(
            branch.sign() * self.a * t.cosh(),
            self.b * t.sinh(),
        ))
    }

    /// 隐式方程值 u²/a² - v²/b² - 1
    pub fn implicit(&self, point: &Point2) -> f64 {
        let l = self.to_local(point);
        l.x * l.x / (self.a * self.a) - l.y * l.y / (self.b * self.b) - 1.0
    }
}

/// 角标记
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleMark {
    pub vertex: Point2,
    /// 第一条边的方向角
    pub start_angle: f64,
    /// 逆时针扫过的角度，[0, 2π)
    pub sweep: f64,
    /// 角度值（度）
    pub degrees: f64,
    /// 是否按直角显示
    pub right: bool,
}

/// 度量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureKind {
    Distance,
    Radius,
}

/// 度量标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// 标签锚点
    pub anchor: Point2,
    pub value: f64,
    pub kind: MeasureKind,
    pub text: String,
}

impl Measurement {
    pub fn new(anchor: Point2, value: f64, kind: MeasureKind) -> Self {
        let text = match kind {
            MeasureKind::Distance => format!("{:.2}", value),
            MeasureKind::Radius => format!("r = {:.2}", value),
        };
        Self {
            anchor,
            value,
            kind,
            text,
        }
    }
}

/// 函数图像 y = f(x)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionGraph {
    pub expression: String,
}

impl FunctionGraph {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

/// 线段等长标记
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentMark {
    pub start: Point2,
    pub end: Point2,
    /// 刻痕数量
    pub ticks: u8,
}

/// 文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// 插入点
    pub position: Point2,
    /// 文本内容
    pub content: String,
}

impl Text {
    pub fn new(position: Point2, content: impl Into<String>) -> Self {
        Self {
            position,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length() {
        let line = Line::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_line_nearest_respects_extent() {
        let seg = Line::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        assert_eq!(seg.nearest_point(&Point2::new(-5.0, 3.0)), Point2::new(0.0, 0.0));

        let ray = seg.with_extent(LineExtent::Ray);
        assert_eq!(ray.nearest_point(&Point2::new(15.0, 3.0)), Point2::new(15.0, 0.0));
        assert_eq!(ray.nearest_point(&Point2::new(-5.0, 3.0)), Point2::new(0.0, 0.0));

        let inf = seg.with_extent(LineExtent::Infinite);
        assert_eq!(inf.nearest_point(&Point2::new(-5.0, 3.0)), Point2::new(-5.0, 0.0));
    }

    #[test]
    fn test_arc_contains_angle_wraps() {
        let pi = std::f64::consts::PI;
        let arc = Arc::new(Point2::origin(), 1.0, 1.5 * pi, 0.5 * pi);
        assert!(arc.contains_angle(0.0));
        assert!(arc.contains_angle(-0.25 * pi));
        assert!(!arc.contains_angle(pi));
        assert!(arc.nearest_point(&Point2::new(-2.0, 0.0)).is_none());
    }

    #[test]
    fn test_arc_contains_angle_just_below_start() {
        let arc = Arc::new(Point2::origin(), 1.0, 1.0, 2.0);
        // 比起始角小一个 ulp，归一化后应为 0 而不是 2π
        let below = 1.0 - f64::EPSILON / 2.0;
        assert!(below < 1.0);
        assert!(arc.contains_angle(below));
        assert!(!arc.contains_angle(0.5));
    }

    #[test]
    fn test_ellipse_points_on_curve() {
        let e = Ellipse::new(Point2::new(2.0, -1.0), 5.0, 3.0, 0.4);
        for i in 0..16 {
            let p = e.point_at(i as f64 * 0.4);
            assert!(e.implicit(&p).abs() < 1e-12);
        }
        let (f1, f2) = e.foci();
        let p = e.point_at(1.1);
        let sum = (p - f1).norm() + (p - f2).norm();
        assert!((sum - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_parabola_focus_directrix_property() {
        let parabola = Parabola::new(Point2::new(1.0, 2.0), 1.5, 0.7);
        let focus = parabola.focus();
        let directrix = parabola.directrix();
        for i in -10..=10 {
            let p = parabola.point_at(i as f64);
            let to_focus = (p - focus).norm();
            let to_directrix = directrix.distance_to_point(&p);
            assert!((to_focus - to_directrix).abs() < 1e-9);
            assert!(parabola.implicit(&p).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hyperbola_vertical_local_frame() {
        let h = Hyperbola::new(Point2::new(1.0, 1.0), 2.0, 1.0, HyperbolaOrientation::Vertical);
        let p = h.point_at(0.0, Branch::Primary);
        assert!((p.x - 1.0).abs() < EPSILON);
        assert!((p.y - 3.0).abs() < EPSILON);
        let q = h.point_at(0.0, Branch::Secondary);
        assert!((q.y + 1.0).abs() < EPSILON);
    }
}
