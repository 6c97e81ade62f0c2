//! 依赖传播引擎
//!
//! `compute` 根据定义从依赖的当前值重新计算一个元素的几何属性；
//! `propagate` 沿反向依赖索引做广度优先级联，逐个重算所有下游元素。
//!
//! 无环部分按拓扑顺序每个元素只重算一次。通过 `ElementStore` 构造的图不会有环；
//! 直接对任意切片调用 `propagate` 时，环上的元素按工作队列反复重算，
//! 次数受 `PropagationConfig::max_iterations` 限制，触发时报告里 `truncated` 为 true。

use crate::conic::{
    ellipse_by_foci, hyperbola_from_equation, parabola_from_equation,
    parabola_from_focus_directrix, parabola_from_vertex_focus,
};
use crate::construct::{
    angle_between, get_circumcenter, get_incenter, get_parallel_point, get_perpendicular_foot,
    get_perpendicular_point, get_tangent_points, is_right_angle, midpoint,
    RIGHT_ANGLE_TOLERANCE_DEG,
};
use crate::element::{Definition, Element, ElementId, ElementKind};
use crate::error::ComputeError;
use crate::geometry::{
    AngleMark, Arc, Circle, Geometry, Line, LineExtent, MeasureKind, Measurement, SegmentMark,
};
use crate::math::{distance, Point2, EPSILON};
use crate::transform::transform_triangle;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// 传播配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// 环上元素的最大重算次数
    pub max_iterations: usize,
    /// 直角判定容差（度）
    pub right_angle_tolerance_deg: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            right_angle_tolerance_deg: RIGHT_ANGLE_TOLERANCE_DEG,
        }
    }
}

/// 按ID查找元素
pub trait Resolve {
    fn resolve(&self, id: ElementId) -> Option<&Element>;
}

impl Resolve for [Element] {
    fn resolve(&self, id: ElementId) -> Option<&Element> {
        self.iter().find(|e| e.id == id)
    }
}

impl Resolve for Vec<Element> {
    fn resolve(&self, id: ElementId) -> Option<&Element> {
        self.as_slice().resolve(id)
    }
}

impl Resolve for HashMap<ElementId, Element> {
    fn resolve(&self, id: ElementId) -> Option<&Element> {
        self.get(&id)
    }
}

/// 在已有集合之上叠加一个尚未存入的元素
///
/// 插入时用它计算新元素自身，使定义可以看到元素当前的几何值。
pub struct Pending<'a, R: ?Sized> {
    pub base: &'a R,
    pub pending: &'a Element,
}

impl<'a, R: Resolve + ?Sized> Pending<'a, R> {
    pub fn new(base: &'a R, pending: &'a Element) -> Self {
        Self { base, pending }
    }
}

impl<R: Resolve + ?Sized> Resolve for Pending<'_, R> {
    fn resolve(&self, id: ElementId) -> Option<&Element> {
        if id == self.pending.id {
            Some(self.pending)
        } else {
            self.base.resolve(id)
        }
    }
}

/// 带位置索引的切片视图
pub(crate) struct Indexed<'a> {
    pub elements: &'a [Element],
    pub positions: &'a HashMap<ElementId, usize>,
}

impl Resolve for Indexed<'_> {
    fn resolve(&self, id: ElementId) -> Option<&Element> {
        self.positions.get(&id).and_then(|&i| self.elements.get(i))
    }
}

/// 反向依赖索引：id → 直接依赖它的元素
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    dependents: HashMap<ElementId, Vec<ElementId>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(elements: &[Element]) -> Self {
        let mut index = Self::new();
        for element in elements {
            index.add(element);
        }
        index
    }

    pub fn add(&mut self, element: &Element) {
        for dep in &element.dependencies {
            let list = self.dependents.entry(*dep).or_default();
            if !list.contains(&element.id) {
                list.push(element.id);
            }
        }
    }

    /// 移除元素：既不再作为下游出现，也不再有下游列表
    pub fn remove(&mut self, element: &Element) {
        for dep in &element.dependencies {
            if let Some(list) = self.dependents.get_mut(dep) {
                list.retain(|id| *id != element.id);
                if list.is_empty() {
                    self.dependents.remove(dep);
                }
            }
        }
        self.dependents.remove(&element.id);
    }

    pub fn dependents_of(&self, id: ElementId) -> &[ElementId] {
        self.dependents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// 一次级联的结果摘要
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropagationReport {
    /// 成功重算的元素（按处理顺序，只有环上的元素会重复）
    pub recomputed: Vec<ElementId>,
    /// 达到迭代上限而提前终止
    pub truncated: bool,
}

/// 重新计算元素的几何属性
///
/// 自由元素、依赖缺失或类别不符、几何退化时返回 None。
pub fn compute<R: Resolve + ?Sized>(element: &Element, resolver: &R) -> Option<Geometry> {
    compute_with(element, resolver, &PropagationConfig::default())
}

pub fn compute_with<R: Resolve + ?Sized>(
    element: &Element,
    resolver: &R,
    config: &PropagationConfig,
) -> Option<Geometry> {
    if element.is_free() {
        return None;
    }
    match derive(element, resolver, config) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            tracing::trace!(element = %element.id, error = %e, "recompute skipped");
            None
        }
    }
}

/// 从 `changed` 出发级联重算，返回更新后的集合副本
pub fn propagate(changed: ElementId, elements: &[Element]) -> Vec<Element> {
    propagate_with(changed, elements, &PropagationConfig::default()).0
}

pub fn propagate_with(
    changed: ElementId,
    elements: &[Element],
    config: &PropagationConfig,
) -> (Vec<Element>, PropagationReport) {
    let mut working = elements.to_vec();
    let positions: HashMap<ElementId, usize> = working
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id, i))
        .collect();
    let index = DependencyIndex::build(&working);
    let report = cascade(changed, &mut working, &positions, &index, config);
    (working, report)
}

/// 原地级联
///
/// 先收集 `changed` 的全部传递下游，再按拓扑顺序每个元素重算一次。
/// 剩下入度不为零的元素位于环上，改用工作队列反复重算，
/// 受 `max_iterations` 限制。
pub(crate) fn cascade(
    changed: ElementId,
    elements: &mut [Element],
    positions: &HashMap<ElementId, usize>,
    index: &DependencyIndex,
    config: &PropagationConfig,
) -> PropagationReport {
    let mut report = PropagationReport::default();

    // 受影响的元素（BFS 顺序，不含 changed 本身）
    let mut affected = Vec::new();
    let mut seen = HashSet::from([changed]);
    let mut frontier = VecDeque::from([changed]);
    while let Some(id) = frontier.pop_front() {
        for &dependent in index.dependents_of(id) {
            if positions.contains_key(&dependent) && seen.insert(dependent) {
                affected.push(dependent);
                frontier.push_back(dependent);
            }
        }
    }
    let affected_set: HashSet<ElementId> = affected.iter().copied().collect();

    let mut in_degree: HashMap<ElementId, usize> = affected
        .iter()
        .map(|&id| {
            // 同一依赖可能出现多次，索引里只记一次
            let parents: HashSet<ElementId> = elements[positions[&id]]
                .dependencies
                .iter()
                .copied()
                .filter(|dep| affected_set.contains(dep))
                .collect();
            (id, parents.len())
        })
        .collect();

    let mut ready: VecDeque<ElementId> = affected
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut settled = 0usize;
    while let Some(id) = ready.pop_front() {
        settled += 1;
        recompute(id, elements, positions, config, &mut report);
        for &dependent in index.dependents_of(id) {
            if let Some(degree) = in_degree.get_mut(&dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(dependent);
                }
            }
        }
    }

    let mut steps = 0usize;
    if settled < affected.len() {
        let cyclic: HashSet<ElementId> = in_degree
            .iter()
            .filter(|(_, &degree)| degree > 0)
            .map(|(&id, _)| id)
            .collect();
        let mut queue: VecDeque<ElementId> = affected
            .iter()
            .copied()
            .filter(|id| cyclic.contains(id))
            .collect();
        let mut pending: HashSet<ElementId> = queue.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            if steps >= config.max_iterations {
                report.truncated = true;
                tracing::warn!(
                    changed = %changed,
                    max_iterations = config.max_iterations,
                    cyclic = cyclic.len(),
                    "propagation truncated at iteration cap"
                );
                break;
            }
            steps += 1;
            pending.remove(&id);
            recompute(id, elements, positions, config, &mut report);
            for &dependent in index.dependents_of(id) {
                if cyclic.contains(&dependent) && pending.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
    }

    tracing::debug!(
        changed = %changed,
        affected = affected.len(),
        cycle_steps = steps,
        recomputed = report.recomputed.len(),
        "propagation finished"
    );
    report
}

/// 重算单个元素，失败时保留旧值
fn recompute(
    id: ElementId,
    elements: &mut [Element],
    positions: &HashMap<ElementId, usize>,
    config: &PropagationConfig,
    report: &mut PropagationReport,
) {
    let Some(&pos) = positions.get(&id) else {
        return;
    };
    let next = {
        let resolver = Indexed {
            elements: &*elements,
            positions,
        };
        compute_with(&elements[pos], &resolver, config)
    };
    if let Some(geometry) = next {
        elements[pos].geometry = geometry;
        report.recomputed.push(id);
    }
}

fn lookup<R: Resolve + ?Sized>(resolver: &R, id: ElementId) -> Result<&Element, ComputeError> {
    resolver
        .resolve(id)
        .ok_or(ComputeError::MissingDependency(id))
}

fn point<R: Resolve + ?Sized>(resolver: &R, id: ElementId) -> Result<Point2, ComputeError> {
    let el = lookup(resolver, id)?;
    el.geometry.as_point().ok_or(ComputeError::WrongKind {
        id,
        expected: ElementKind::Point,
        found: el.kind(),
    })
}

fn line<R: Resolve + ?Sized>(resolver: &R, id: ElementId) -> Result<Line, ComputeError> {
    let el = lookup(resolver, id)?;
    el.geometry.as_line().copied().ok_or(ComputeError::WrongKind {
        id,
        expected: ElementKind::Line,
        found: el.kind(),
    })
}

/// 圆或圆弧所在的圆
fn circle<R: Resolve + ?Sized>(resolver: &R, id: ElementId) -> Result<Circle, ComputeError> {
    let el = lookup(resolver, id)?;
    match &el.geometry {
        Geometry::Circle(c) => Ok(*c),
        Geometry::Arc(a) => Ok(a.circle()),
        other => Err(ComputeError::WrongKind {
            id,
            expected: ElementKind::Circle,
            found: other.kind(),
        }),
    }
}

fn triangle<R: Resolve + ?Sized>(
    resolver: &R,
    p1: ElementId,
    p2: ElementId,
    p3: ElementId,
) -> Result<[Point2; 3], ComputeError> {
    Ok([point(resolver, p1)?, point(resolver, p2)?, point(resolver, p3)?])
}

fn derive<R: Resolve + ?Sized>(
    element: &Element,
    r: &R,
    config: &PropagationConfig,
) -> Result<Geometry, ComputeError> {
    let geometry = match element.definition {
        Definition::Free => return Err(ComputeError::Degenerate("free element")),

        Definition::Midpoint { p1, p2 } => Geometry::Point(midpoint(&point(r, p1)?, &point(r, p2)?)),

        Definition::LineFromPoints { p1, p2 } => {
            // 延伸方式属于元素自身，重算时保留
            let extent = match &element.geometry {
                Geometry::Line(l) => l.extent,
                _ => LineExtent::Segment,
            };
            Geometry::Line(Line::new(point(r, p1)?, point(r, p2)?).with_extent(extent))
        }

        Definition::CircleByPoints { center, edge } => {
            let c = point(r, center)?;
            let e = point(r, edge)?;
            Geometry::Circle(Circle::new(c, distance(&c, &e)))
        }

        Definition::CircleByRadius { center, radius } => {
            if !radius.is_finite() || radius < 0.0 {
                return Err(ComputeError::Degenerate("invalid radius"));
            }
            Geometry::Circle(Circle::new(point(r, center)?, radius))
        }

        Definition::Angle3Points { p1, vertex, p2 } => {
            let v = point(r, vertex)?;
            let (start_angle, sweep) = angle_between(&point(r, p1)?, &v, &point(r, p2)?)
                .ok_or(ComputeError::Degenerate("angle side has zero length"))?;
            let degrees = sweep.to_degrees();
            Geometry::Angle(AngleMark {
                vertex: v,
                start_angle,
                sweep,
                degrees,
                right: is_right_angle(degrees, config.right_angle_tolerance_deg),
            })
        }

        Definition::EllipseByFoci { f1, f2, point_on } => Geometry::Ellipse(
            ellipse_by_foci(&point(r, f1)?, &point(r, f2)?, &point(r, point_on)?)
                .ok_or(ComputeError::Degenerate("point lies on the focal segment"))?,
        ),

        Definition::ParabolaByVertexFocus { vertex, focus } => Geometry::Parabola(
            parabola_from_vertex_focus(&point(r, vertex)?, &point(r, focus)?)
                .ok_or(ComputeError::Degenerate("vertex coincides with focus"))?,
        ),

        Definition::ParabolaByFocusDirectrix { focus, directrix } => {
            let d = line(r, directrix)?;
            Geometry::Parabola(
                parabola_from_focus_directrix(&point(r, focus)?, &d.start, &d.end)
                    .ok_or(ComputeError::Degenerate("focus on directrix"))?,
            )
        }

        Definition::ParabolaByEquation { a, h, k } => Geometry::Parabola(
            parabola_from_equation(a, h, k).ok_or(ComputeError::Degenerate("a = 0"))?,
        ),

        Definition::HyperbolaByEquation {
            a,
            b,
            center_x,
            center_y,
            orientation,
        } => Geometry::Hyperbola(
            hyperbola_from_equation(a, b, center_x, center_y, orientation)
                .ok_or(ComputeError::Degenerate("non-positive semi-axis"))?,
        ),

        Definition::Incenter { p1, p2, p3 } => {
            let [a, b, c] = triangle(r, p1, p2, p3)?;
            Geometry::Point(get_incenter(&a, &b, &c).point)
        }

        Definition::Circumcenter { p1, p2, p3 } => {
            let [a, b, c] = triangle(r, p1, p2, p3)?;
            Geometry::Point(get_circumcenter(&a, &b, &c).point)
        }

        Definition::Incircle { p1, p2, p3 } => {
            let [a, b, c] = triangle(r, p1, p2, p3)?;
            let center = get_incenter(&a, &b, &c);
            Geometry::Circle(Circle::new(center.point, center.radius))
        }

        Definition::Circumcircle { p1, p2, p3 } => {
            let [a, b, c] = triangle(r, p1, p2, p3)?;
            let center = get_circumcenter(&a, &b, &c);
            Geometry::Circle(Circle::new(center.point, center.radius))
        }

        Definition::TangentPoint {
            circle: circle_id,
            external,
            index,
        } => {
            let c = circle(r, circle_id)?;
            let points = get_tangent_points(&c.center, c.radius, &point(r, external)?)
                .ok_or(ComputeError::Degenerate("external point inside circle"))?;
            Geometry::Point(
                *points
                    .get(index)
                    .ok_or(ComputeError::Degenerate("tangent index out of range"))?,
            )
        }

        Definition::PerpendicularFoot { point: p, line: l } => {
            let l = line(r, l)?;
            Geometry::Point(get_perpendicular_foot(&point(r, p)?, &l.start, &l.end))
        }

        Definition::ParallelLine { line: l, through } => {
            let l = line(r, l)?;
            let t = point(r, through)?;
            let second = get_parallel_point(&t, &l.start, &l.end, l.length().max(1.0));
            Geometry::Line(Line::infinite(t, second))
        }

        Definition::PerpendicularLine { line: l, through } => {
            let l = line(r, l)?;
            let t = point(r, through)?;
            let second = get_perpendicular_point(&t, &l.start, &l.end, l.length().max(1.0));
            Geometry::Line(Line::infinite(t, second))
        }

        Definition::Distance { p1, p2 } => {
            let a = point(r, p1)?;
            let b = point(r, p2)?;
            Geometry::Measurement(Measurement::new(
                midpoint(&a, &b),
                distance(&a, &b),
                MeasureKind::Distance,
            ))
        }

        Definition::Radius { circle: circle_id } => {
            let c = circle(r, circle_id)?;
            let anchor = midpoint(&c.center, &c.point_at_angle(0.0));
            Geometry::Measurement(Measurement::new(anchor, c.radius, MeasureKind::Radius))
        }

        Definition::SegmentMark { segment, ticks } => {
            let l = line(r, segment)?;
            Geometry::SegmentMark(SegmentMark {
                start: l.start,
                end: l.end,
                ticks,
            })
        }

        Definition::ArcByCenter { center, start, end } => {
            let c = point(r, center)?;
            let s = point(r, start)?;
            let e = point(r, end)?;
            let radius = distance(&c, &s);
            if radius < EPSILON || distance(&c, &e) < EPSILON {
                return Err(ComputeError::Degenerate("arc endpoint at center"));
            }
            Geometry::Arc(Arc::new(
                c,
                radius,
                (s.y - c.y).atan2(s.x - c.x),
                (e.y - c.y).atan2(e.x - c.x),
            ))
        }

        Definition::TransformedVertex {
            p1,
            p2,
            p3,
            anchor,
            index,
            transform,
        } => {
            let source = triangle(r, p1, p2, p3)?;
            let target = point(r, anchor)?;
            let placed = transform_triangle(&source, &transform, target);
            Geometry::Point(
                *placed
                    .get(index)
                    .ok_or(ComputeError::Degenerate("vertex index out of range"))?,
            )
        }
    };
    Ok(geometry)
}
